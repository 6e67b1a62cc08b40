//! Language detection from file extensions

use std::collections::BTreeSet;

const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "React"),
    ("tsx", "React"),
    ("java", "Java"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("cs", "C#"),
    ("cpp", "C++"),
    ("c", "C"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("vue", "Vue.js"),
    ("svelte", "Svelte"),
    ("dart", "Dart"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("clj", "Clojure"),
    ("hs", "Haskell"),
    ("lua", "Lua"),
    ("r", "R"),
    ("R", "R"),
    ("jl", "Julia"),
    ("pl", "Perl"),
    ("sh", "Shell"),
    ("bash", "Bash"),
    ("zsh", "Zsh"),
];

fn language_for(path: &str) -> Option<&'static str> {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = filename.rsplit_once('.')?;
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, language)| *language)
}

/// Distinct languages present in the tree, alphabetically.
pub fn detect_languages(tree: &[String]) -> Vec<String> {
    tree.iter()
        .filter_map(|path| language_for(path))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
