//! Framework detection from manifest contents
//!
//! `package.json` is matched by dependency key; every other ecosystem is a
//! substring scan over the lowercased manifest.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const JS_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("react-dom", "React"),
    ("vue", "Vue.js"),
    ("@vue/", "Vue.js"),
    ("angular", "Angular"),
    ("@angular/", "Angular"),
    ("next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("express", "Express.js"),
    ("fastify", "Fastify"),
    ("@nestjs/", "NestJS"),
    ("svelte", "Svelte"),
    ("gatsby", "Gatsby"),
    ("remix", "Remix"),
    ("electron", "Electron"),
    ("jest", "Jest"),
    ("mocha", "Mocha"),
    ("webpack", "Webpack"),
    ("vite", "Vite"),
    ("tailwindcss", "Tailwind CSS"),
    ("prisma", "Prisma"),
    ("mongoose", "MongoDB"),
    ("sequelize", "Sequelize"),
    ("typeorm", "TypeORM"),
];

const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("pytorch", "PyTorch"),
    ("torch", "PyTorch"),
    ("tensorflow", "TensorFlow"),
    ("pandas", "Pandas"),
    ("numpy", "NumPy"),
    ("langchain", "LangChain"),
    ("langgraph", "LangGraph"),
    ("scikit-learn", "scikit-learn"),
    ("sklearn", "scikit-learn"),
    ("celery", "Celery"),
    ("sqlalchemy", "SQLAlchemy"),
    ("pytest", "pytest"),
    ("streamlit", "Streamlit"),
    ("gradio", "Gradio"),
    ("transformers", "Hugging Face Transformers"),
    ("openai", "OpenAI"),
    ("anthropic", "Anthropic"),
    ("pydantic", "Pydantic"),
    ("httpx", "HTTPX"),
    ("aiohttp", "aiohttp"),
    ("requests", "Requests"),
    ("beautifulsoup", "BeautifulSoup"),
    ("scrapy", "Scrapy"),
    ("selenium", "Selenium"),
    ("playwright", "Playwright"),
];

const RUST_FRAMEWORKS: &[(&str, &str)] = &[
    ("actix-web", "Actix Web"),
    ("axum", "Axum"),
    ("rocket", "Rocket"),
    ("tokio", "Tokio"),
    ("serde", "Serde"),
    ("diesel", "Diesel"),
    ("sqlx", "SQLx"),
];

const GO_FRAMEWORKS: &[(&str, &str)] = &[
    ("gin-gonic", "Gin"),
    ("echo", "Echo"),
    ("fiber", "Fiber"),
    ("gorilla/mux", "Gorilla Mux"),
    ("gorm", "GORM"),
];

const RUBY_FRAMEWORKS: &[(&str, &str)] = &[
    ("rails", "Ruby on Rails"),
    ("sinatra", "Sinatra"),
    ("rspec", "RSpec"),
    ("sidekiq", "Sidekiq"),
];

const PYTHON_MANIFESTS: &[&str] = &["pyproject.toml", "requirements.txt", "setup.py", "setup.cfg"];

fn scan_keywords(content: &str, table: &[(&str, &'static str)], found: &mut BTreeSet<&'static str>) {
    let lower = content.to_lowercase();
    for (pattern, framework) in table {
        if lower.contains(pattern) {
            found.insert(*framework);
        }
    }
}

fn scan_package_json(path: &str, content: &str, found: &mut BTreeSet<&'static str>) {
    let manifest: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path, "Failed to parse package.json: {}", err);
            return;
        }
    };

    let dependency_names = ["dependencies", "devDependencies"]
        .into_iter()
        .filter_map(|key| manifest.get(key).and_then(Value::as_object))
        .flat_map(|deps| deps.keys());

    for dep in dependency_names {
        let dep = dep.to_lowercase();
        if let Some((_, framework)) = JS_FRAMEWORKS.iter().find(|(pattern, _)| dep.contains(pattern)) {
            found.insert(*framework);
        }
    }
}

/// Frameworks named by the given manifests (`path -> content`),
/// alphabetically.
pub fn detect_frameworks(config_files: &HashMap<String, String>) -> Vec<String> {
    let mut found: BTreeSet<&'static str> = BTreeSet::new();

    for (path, content) in config_files {
        let lower = path.to_lowercase();
        if lower.ends_with("package.json") {
            scan_package_json(path, content, &mut found);
        } else if PYTHON_MANIFESTS.iter().any(|suffix| lower.ends_with(suffix)) {
            scan_keywords(content, PYTHON_FRAMEWORKS, &mut found);
        } else if lower.ends_with("cargo.toml") {
            scan_keywords(content, RUST_FRAMEWORKS, &mut found);
        } else if lower.ends_with("go.mod") {
            scan_keywords(content, GO_FRAMEWORKS, &mut found);
        } else if lower.ends_with("gemfile") {
            scan_keywords(content, RUBY_FRAMEWORKS, &mut found);
        }
    }

    found.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_package_json_dependencies() {
        let manifest = r#"{
            "dependencies": {"react": "^18", "react-dom": "^18", "@nestjs/core": "10"},
            "devDependencies": {"vite": "5", "left-pad": "1"}
        }"#;
        let found = detect_frameworks(&files(&[("web/package.json", manifest)]));
        assert_eq!(found, vec!["NestJS", "React", "Vite"]);
    }

    #[test]
    fn test_malformed_package_json_contributes_nothing() {
        let found = detect_frameworks(&files(&[
            ("package.json", "{ not json"),
            ("requirements.txt", "Flask==3.0\nSQLAlchemy"),
        ]));
        assert_eq!(found, vec!["Flask", "SQLAlchemy"]);
    }

    #[test]
    fn test_keyword_ecosystems() {
        let found = detect_frameworks(&files(&[
            ("Cargo.toml", "[dependencies]\ntokio = \"1\"\naxum = \"0.7\""),
            ("go.mod", "module x\nrequire github.com/gin-gonic/gin v1.9.0"),
            ("Gemfile", "gem 'rails', '~> 7.0'"),
        ]));
        assert_eq!(found, vec!["Axum", "Gin", "Ruby on Rails", "Tokio"]);
    }

    #[test]
    fn test_unrelated_files_ignored() {
        assert!(detect_frameworks(&files(&[("README.md", "Built with django and react")])).is_empty());
    }
}
