//! Fixed assistant wording and result formatting

use super::state::MenuOption;
use crate::providers::{ChatRequest, ChatTurn, ProviderErrorKind, SearchHit};
use crate::store::OutboundMessage;

pub const GREETING: &str =
    "Halo! Saya asisten AI Anda. Saya bisa membantu Anda menganalisis performa dan kualitas website Anda.";
pub const ASK_URL: &str = "Silakan masukkan URL website yang ingin Anda analisis.";
pub const INVALID_URL: &str =
    "URL tidak valid atau domain tidak dapat diakses. Silakan masukkan ulang URL atau domain yang valid.";

pub const OFFLINE: &str = "Sistem sedang offline.";
pub const OFFLINE_APOLOGY: &str =
    "Mohon maaf atas ketidaknyamanannya. Silakan coba lagi nanti atau hubungi kami untuk informasi lebih lanjut.";

pub const MENU_PROMPT: &str = "Bagus! Data apa yang ingin Anda lihat untuk website ini?";
pub const MENU_AGAIN: &str = "Ingin melakukan pengecekan lainnya?";
pub const MENU_GREETING: &str = "Halo! Bagaimana saya bisa membantu Anda hari ini?";
pub const MENU_FALLBACK: &str = "Silakan pilih layanan yang ingin Anda butuhkan di bawah ini:";

pub const AUDIT_WAIT: &str = "Proses memakan waktu 1-2 menit. Mohon tunggu...";
pub const ASK_SEO_KEYWORD: &str =
    "Untuk analisis SEO yang lebih akurat, apa keyword utama yang ingin Anda targetkan?";
pub const ASK_BRAND_QUERY: &str = "Apa yang biasanya dicari konsumen tentang kategori brand Anda?";
pub const BRAND_QUERY_HINT: &str =
    "Contoh seperti \"sepatu lari\", \"smartphone terbaru\", atau \"makanan sehat\".";

pub const NOT_FOUND_FIRST_PAGE: &str = "Website tidak ditemukan di halaman 1. Lihat halaman berikutnya?";
pub const NOT_FOUND: &str = "Website tidak ditemukan di halaman ini.";
pub const SEARCH_ESCALATION: &str =
    "Konsultasikan lebih lanjut dengan kami jika Anda memerlukan bantuan untuk meningkatkan peringkat website Anda.";
pub const AUDIT_ESCALATION: &str = "Jika Anda tidak bisa memperbaiki masalah ini, kami siap membantu!";
pub const CONTACT_LABEL: &str = "Hubungi Kami via WhatsApp";

pub const REFUSAL: &str =
    "Maaf, kami tidak bisa membantu permintaan Anda. Silakan pilih opsi analisis yang tersedia.";
pub const APOLOGY: &str = "Maaf, terjadi kesalahan saat mengambil data. Silakan coba lagi.";
pub const APOLOGY_NETWORK: &str = "Maaf, terjadi kesalahan jaringan. Silakan coba lagi.";

const BRAND_SYSTEM_PROMPT: &str =
    "Anda adalah asisten AI yang membantu menganalisis performa brand di AI Search.";
const FALLBACK_SYSTEM_PROMPT: &str = "Anda adalah asisten AI yang membantu menganalisis performa website. Jawab pertanyaan pengguna dengan informasi yang berguna terkait website mereka.";

pub fn menu(prompt: &str) -> OutboundMessage {
    OutboundMessage::options(prompt, &MenuOption::MENU)
}

pub fn next_page_offer() -> OutboundMessage {
    OutboundMessage::options(NOT_FOUND_FIRST_PAGE, &[MenuOption::NextPage])
}

pub fn apology(kind: ProviderErrorKind) -> OutboundMessage {
    if kind.is_transport() {
        OutboundMessage::text(APOLOGY_NETWORK)
    } else {
        OutboundMessage::text(APOLOGY)
    }
}

/// Contact call-to-action: text followed by the link block
pub fn escalation(text: &str, contact_url: &str) -> [OutboundMessage; 2] {
    [
        OutboundMessage::text(text),
        OutboundMessage::contact(CONTACT_LABEL, contact_url),
    ]
}

/// Markdown listing of one result page
pub fn search_results(query: &str, page: u32, hits: &[SearchHit]) -> OutboundMessage {
    let header = format!("Berikut hasil pencarian untuk **\"{query}\"** (Google page Ke-{page}):");
    if hits.is_empty() {
        return OutboundMessage::result_text(format!("{header}\n\nTidak ada hasil pencarian."));
    }
    let listing = hits
        .iter()
        .map(|hit| format!("{}. **[{}]({})**\n{}", hit.position, hit.title, hit.link, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");
    OutboundMessage::result_text(format!("{header}\n\n{listing}"))
}

pub fn found_at(position: u32, query: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "Website Anda muncul di posisi ke-{position} pada hasil pencarian **\"{query}\"** di halaman Google."
    ))
}

/// Structured ranked-list prompt for the brand AI-search check
pub fn brand_request(query: &str, subject_url: &str) -> ChatRequest {
    let prompt = format!(
        "Buat respons terstruktur untuk pencarian frase \"{query}\" dengan format seperti contoh berikut, tapi isi dengan data nyata berdasarkan pencarian Anda:

Berikut hasil pencarian dengan kata kunci **\"{query}\"** berdasarkan evaluasi dari berbagai sumber dan review pengguna di internet. Saya melakukan pencarian tanpa terpaku pada link yang Anda berikan, sehingga fokus utama adalah mencari [jenis pencarian] yang memang populer dan banyak direkomendasikan. Berikut informasi dan daftar 5 [jenis item] terbaik:

**[Nama Item 1]**
[Deskripsi panjang tentang item 1].

**[Nama Item 2]**
[Deskripsi panjang].

[Lanjutkan untuk 5 item]

**Catatan penting:**

[Catatan tentang website {subject_url} jika relevan].

Daftar di atas berdasarkan [sumber].

Jika fokus Anda adalah melakukan pengecekan performa website {subject_url} dalam konteks pencarian tersebut, maka [analisis posisi].

Gunakan format markdown sederhana (tebal, miring, tautan)."
    );
    ChatRequest::new(vec![ChatTurn::system(BRAND_SYSTEM_PROMPT), ChatTurn::user(prompt)])
}

/// Friendly explanation of what the assistant can and cannot do
pub fn fallback_request(input: &str) -> ChatRequest {
    let prompt = format!(
        "Ini adalah inputan user ke sistem kami \"{input}\". Jawab dengan bahasa seperti manusia, santai dan tidak kaku, tapi jelaskan juga bahwa kami tidak bisa melakukan itu. Kami hanya bisa melakukan audit kualitas website, cek performance SEO di search engine, dan cek performance brand di pencarian AI."
    );
    ChatRequest::new(vec![ChatTurn::system(FALLBACK_SYSTEM_PROMPT), ChatTurn::user(prompt)])
}
