//! Organizer configuration.
//!
//! The pipeline only consumes a resolved `OrganizerConfig`; saving and merging
//! settings belongs to whatever shell drives it. `from_file` exists so the CLI
//! can read a JSON settings file, every field falls back to its default.

use crate::error::{OrganizeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Reserved name of the per-folder history file
pub const HISTORY_FILE_NAME: &str = ".tidyfolder_history.json";

/// Extension rule: every extension in `extensions` maps to the folder `name`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionRule {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Keyword list for one document category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Tunable decision thresholds.
///
/// Defaults are the values the organizer has always shipped with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Minimum summed keyword occurrences for a category to count as detected
    pub keyword_min_score: usize,
    /// Semantic labels must score strictly above this confidence
    pub semantic_min_confidence: f32,
    /// Minimum text length (chars) before the semantic scorer is consulted
    pub semantic_min_text_chars: usize,
    /// Minimum trimmed text length (chars) for content analysis
    pub min_content_chars: usize,
    /// CPU utilization (%) above which the worker count is cut
    pub cpu_busy_percent: f32,
    /// Share of workers kept when the CPU is busy (%)
    pub cpu_keep_percent: usize,
    /// Memory utilization (%) above which the worker count is cut
    pub memory_busy_percent: f32,
    /// Share of workers kept when memory is under pressure (%)
    pub memory_keep_percent: usize,
    /// Hosts with less physical memory than this are capped at `low_memory_max_workers`
    pub low_memory_bytes: u64,
    pub low_memory_max_workers: usize,
    /// Absolute worker ceiling
    pub max_workers: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            keyword_min_score: 2,
            semantic_min_confidence: 0.30,
            semantic_min_text_chars: 100,
            min_content_chars: 20,
            cpu_busy_percent: 70.0,
            cpu_keep_percent: 60,
            memory_busy_percent: 80.0,
            memory_keep_percent: 70,
            low_memory_bytes: 4 * 1024 * 1024 * 1024,
            low_memory_max_workers: 4,
            max_workers: 32,
        }
    }
}

/// Resolved organizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizerConfig {
    /// Extension → category table, checked in order
    pub categories: Vec<ExtensionRule>,
    /// Keyword table used for content analysis, in tie-break order
    pub document_categories: Vec<KeywordCategory>,
    /// Words ignored by keyword analysis
    pub stop_words: Vec<String>,
    /// File and directory names never touched by a scan
    pub ignore_patterns: Vec<String>,
    /// Files larger than this are skipped
    pub max_file_size: u64,
    /// Requested number of workers
    pub thread_count: usize,
    /// Allow image captioning in AI mode
    pub ai_enabled: bool,
    /// Allow document content analysis
    pub document_ai_enabled: bool,
    pub backup_enabled: bool,
    /// Object acceptance threshold, percent (1-100)
    pub object_threshold: u32,
    /// Maximum number of objects kept per image
    pub max_objects: usize,
    /// Derive the worker count from system load
    pub enable_system_optimization: bool,
    pub thresholds: Thresholds,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            categories: default_extension_rules(),
            document_categories: default_keyword_categories(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            max_file_size: 500 * 1024 * 1024,
            thread_count: 8,
            ai_enabled: true,
            document_ai_enabled: true,
            backup_enabled: true,
            object_threshold: 30,
            max_objects: 3,
            enable_system_optimization: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl OrganizerConfig {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| OrganizeError::io(path, e))?;
        let config: OrganizerConfig =
            serde_json::from_str(&raw).map_err(|e| OrganizeError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            categories = config.categories.len(),
            document_categories = config.document_categories.len(),
            "Loaded organizer config"
        );

        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                tracing::info!(path = %p.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Default config location (`~/.config/tidyfolder/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tidyfolder").join("config.json"))
    }

    /// Category for an extension (`.pdf`, case-insensitive), first match wins
    pub fn category_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = ext.to_lowercase();
        self.categories
            .iter()
            .find(|rule| rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .map(|rule| rule.name.as_str())
    }

    /// Names skipped during scans; always contains the history file
    pub fn ignore_set(&self) -> HashSet<String> {
        let mut set: HashSet<String> = self.ignore_patterns.iter().cloned().collect();
        set.insert(HISTORY_FILE_NAME.to_string());
        set
    }

    /// Object acceptance threshold as a 0.0-1.0 ratio
    pub fn object_threshold_ratio(&self) -> f32 {
        self.object_threshold.clamp(1, 100) as f32 / 100.0
    }
}

const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".svn",
    ".idea",
    "__pycache__",
    "Thumbs.db",
    ".DS_Store",
    "desktop.ini",
];

const DEFAULT_STOP_WORDS: &[&str] = &[
    "acaba", "ama", "aslında", "az", "bazı", "belki", "biri", "birkaç", "birşey", "biz", "bu",
    "çok", "çünkü", "da", "daha", "de", "defa", "diye", "eğer", "en", "gibi", "hem", "hep",
    "hepsi", "her", "hiç", "için", "ile", "ise", "kez", "ki", "kim", "mı", "mu", "mü", "nasıl",
    "ne", "neden", "nerde", "nerede", "nereye", "niçin", "niye", "o", "sanki", "şey", "siz", "şu",
    "tüm", "ve", "veya", "ya", "yani",
];

fn rule(name: &str, items: &[&str]) -> (String, Vec<String>) {
    (
        name.to_string(),
        items.iter().map(|s| s.to_string()).collect(),
    )
}

fn default_extension_rules() -> Vec<ExtensionRule> {
    [
        rule("Görseller", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".tiff", ".ico"]),
        rule("Belgeler", &[".pdf", ".docx", ".doc", ".txt", ".rtf", ".odt", ".md", ".tex"]),
        rule("Ofis_Dosyaları", &[".xlsx", ".xls", ".pptx", ".ppt", ".csv", ".ods", ".odp"]),
        rule("Videolar", &[".mp4", ".mkv", ".mov", ".avi", ".wmv", ".flv", ".webm", ".m4v", ".3gp"]),
        rule("Müzik", &[".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg", ".wma", ".midi"]),
        rule("Arşivler", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".iso"]),
        rule("Uygulamalar", &[".exe", ".msi", ".dmg", ".apk", ".deb", ".rpm", ".appimage"]),
        rule("Yazılım_Kod", &[".py", ".html", ".css", ".js", ".cpp", ".c", ".java", ".php", ".rb", ".go", ".rs", ".swift"]),
        rule("Veritabanı", &[".db", ".sql", ".sqlite", ".mdb", ".accdb"]),
        rule("E-Kitaplar", &[".epub", ".mobi", ".azw", ".azw3"]),
        rule("Fontlar", &[".ttf", ".otf", ".woff", ".woff2"]),
        rule("3D_Modeller", &[".stl", ".obj", ".fbx", ".blend", ".3ds", ".dae"]),
        rule("CAD_Dosyaları", &[".dwg", ".dxf", ".skp"]),
        rule("Tasarım", &[".psd", ".ai", ".indd", ".xd", ".fig", ".sketch"]),
        rule("Sistem", &[".dll", ".sys", ".ini", ".cfg", ".bat", ".sh", ".reg"]),
    ]
    .into_iter()
    .map(|(name, extensions)| ExtensionRule { name, extensions })
    .collect()
}

fn default_keyword_categories() -> Vec<KeywordCategory> {
    [
        rule("Finans", &["bütçe", "fatura", "ödeme", "bank", "para", "hesap", "mali", "finans", "kredi", "borç", "yatırım", "borsa", "döviz", "vergi", "maaş"]),
        rule("Eğitim", &["ders", "ödev", "proje", "sınav", "okul", "üniversite", "eğitim", "öğrenci", "not", "sınıf", "kurs", "seminer", "akademik", "tez", "ders notu"]),
        rule("İş", &["rapor", "toplantı", "proje", "sunum", "iş", "şirket", "yönetim", "strateji", "plan", "çalışan", "müdür", "müşteri", "satış", "pazarlama", "insan kaynakları"]),
        rule("Teknik", &["kod", "yazılım", "donanım", "teknik", "sistem", "network", "server", "database", "program", "algoritma", "yapay zeka", "machine learning", "veri", "analiz"]),
        rule("Sağlık", &["sağlık", "hasta", "tedavi", "rapor", "ilaç", "doktor", "hastane", "muayene", "tahlil", "reçete", "ameliyat", "tedavi", "psikoloji", "terapi"]),
        rule("Hukuk", &["sözleşme", "kanun", "yasa", "hukuk", "dava", "avukat", "mahkeme", "anlaşma", "taraflar", "madde", "yargı", "ceza", "hüküm", "temyiz"]),
        rule("Kişisel", &["cv", "özgeçmiş", "mektup", "kişisel", "iletişim", "aile", "arkadaş", "ev", "tatil", "gezi", "günlük", "anı", "fotoğraf", "video"]),
        rule("Araştırma", &["araştırma", "makale", "tez", "bilim", "akademik", "yayın", "doktora", "literatür", "deney", "sonuç", "hipotez", "bulgu", "analiz"]),
        rule("Tasarım", &["tasarım", "çizim", "grafik", "resim", "şekil", "layout", "ui", "ux", "renk", "font", "illustrasyon", "mockup", "prototip"]),
        rule("Yönetim", &["plan", "strateji", "hedef", "performans", "kalite", "süreç", "proje yönetimi", "risk", "bütçe", "kpi", "rapor", "analiz", "karar"]),
    ]
    .into_iter()
    .map(|(name, keywords)| KeywordCategory { name, keywords })
    .collect()
}
