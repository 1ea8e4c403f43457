//! Free-text classification for the menu phase

use super::state::MenuOption;

/// Greeting phrases, matched as whole-token sequences
const GREETINGS: &[&str] = &[
    "halo",
    "hai",
    "hi",
    "hello",
    "selamat pagi",
    "selamat siang",
    "selamat malam",
    "hey",
    "apa kabar",
    "bagaimana kabar",
    "bantu",
];

const AUDIT_TRIGGERS: &[&str] = &[
    "audit",
    "kualitas",
    "analisis",
    "quality",
    "analisa",
    "review",
    "evaluasi",
    "inspection",
    "assessment",
    "diagnosis",
    "scan",
    "examine",
    "verify",
    "validate",
    "inspeksi",
    "penilaian",
    "pemeriksaan",
    "validasi",
];

const SEO_TRIGGERS: &[&str] = &[
    "seo",
    "search",
    "engine",
    "optimization",
    "ranking",
    "peringkat",
    "posisi",
    "mesin",
    "optimasi",
    "serp",
    "keyword",
    "onpage",
    "offpage",
    "backlink",
    "meta",
    "title",
    "description",
    "seonya",
];

const BRAND_TRIGGERS: &[&str] = &[
    "brand",
    "ai",
    "search",
    "intelligence",
    "merek",
    "produk",
    "kecerdasan",
    "buatan",
    "artificial",
    "machine",
    "learning",
    "visibility",
    "analytics",
    "powered",
];

/// What a free-text menu input means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Greeting,
    Option(MenuOption),
    Unclassified,
}

fn triggers(option: MenuOption) -> &'static [&'static str] {
    match option {
        MenuOption::AuditQuality => AUDIT_TRIGGERS,
        MenuOption::SeoPerformance => SEO_TRIGGERS,
        MenuOption::BrandAiSearch => BRAND_TRIGGERS,
        MenuOption::NextPage => &[],
    }
}

/// Lowercased whitespace tokens with surrounding punctuation removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t == w))
}

pub fn is_greeting(tokens: &[String]) -> bool {
    GREETINGS.iter().any(|phrase| contains_phrase(tokens, phrase))
}

/// First menu option whose trigger set intersects the tokens
pub fn match_option(tokens: &[String]) -> Option<MenuOption> {
    MenuOption::MENU
        .into_iter()
        .find(|&option| tokens.iter().any(|t| triggers(option).contains(&t.as_str())))
}

/// Greetings win over option triggers
pub fn classify(text: &str) -> Classification {
    let tokens = tokenize(text);
    if is_greeting(&tokens) {
        Classification::Greeting
    } else if let Some(option) = match_option(&tokens) {
        Classification::Option(option)
    } else {
        Classification::Unclassified
    }
}
