#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the build tool report parsers.
///
/// Maven `dependency:tree`, Gradle `dependencies` and sbt `dependencyList`
/// output share the indentation-based tree shape, so one input exercises
/// all three.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = depbom::parsers::parse_maven_tree(s);
        let _ = depbom::parsers::parse_gradle_dependencies(s);
        let _ = depbom::parsers::parse_sbt_dependency_list(s);
    }
});
