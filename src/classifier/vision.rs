//! Object detection on image captions.

/// Extensions the captioner is asked about
pub const CAPTIONABLE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".bmp"];

/// Subcategory used when captioning fails
pub const UNKNOWN_CATEGORY: &str = "Bilinmeyen";

/// AI category when the caption carries no usable word
pub const GENERIC_CATEGORY: &str = "Genel";

const FALLBACK_MAX_CHARS: usize = 20;

/// Object names recognized in captions, in priority order
pub const OBJECT_VOCABULARY: &[&str] = &[
    "car", "truck", "vehicle", "automobile", "bus", "motorcycle", "bicycle", "bike",
    "chair", "table", "desk", "furniture", "sofa", "couch", "bed",
    "computer", "laptop", "phone", "smartphone", "tablet", "monitor", "screen",
    "building", "house", "home", "apartment", "skyscraper", "office",
    "tree", "plant", "flower", "forest", "wood", "nature",
    "mountain", "hill", "valley", "landscape", "scenery",
    "food", "fruit", "vegetable", "meal", "dish", "drink", "water", "coffee", "tea",
    "clothing", "shirt", "pants", "dress", "shoe", "jacket", "hat",
    "sport", "football", "soccer", "basketball", "tennis", "golf", "swimming",
    "music", "guitar", "piano", "violin", "drum", "instrument", "song",
    "book", "document", "paper", "text", "writing", "letter",
    "tool", "hammer", "screwdriver", "wrench", "drill", "saw",
    "art", "painting", "drawing", "sculpture", "statue", "picture", "photo",
    "person", "man", "woman", "child", "baby", "people", "human",
    "animal", "dog", "cat", "bird", "fish", "horse", "elephant", "lion",
    "sky", "cloud", "sun", "moon", "star", "weather", "rain",
    "sea", "ocean", "river", "lake", "beach", "wave",
    "city", "street", "road", "highway", "bridge", "park", "garden",
];

pub fn is_captionable(ext: &str) -> bool {
    CAPTIONABLE_EXTENSIONS.contains(&ext)
}

/// Vocabulary entries mentioned by `caption`.
///
/// Each entry word longer than three chars scores 1.0 for an exact caption
/// word and 0.5 when it is contained in a longer caption word. An entry is
/// accepted when its average score reaches `threshold` (0.0-1.0).
pub fn detect_objects(caption: &str, threshold: f32, max_objects: usize) -> Vec<String> {
    let caption = caption.to_lowercase();
    let caption_words: Vec<&str> = caption.split_whitespace().collect();

    OBJECT_VOCABULARY
        .iter()
        .filter(|keyword| {
            let keyword_words: Vec<&str> = keyword.split_whitespace().collect();
            if keyword_words.is_empty() {
                return false;
            }

            let score: f32 = keyword_words
                .iter()
                .filter(|kw| kw.chars().count() > 3)
                .map(|kw| {
                    if caption_words.contains(kw) {
                        1.0
                    } else if caption_words
                        .iter()
                        .any(|w| w.chars().count() > 3 && w.contains(*kw))
                    {
                        0.5
                    } else {
                        0.0
                    }
                })
                .sum();

            score / keyword_words.len() as f32 >= threshold
        })
        .take(max_objects)
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Folder name derived from detected objects, or from the caption itself
pub fn ai_category(objects: &[String], caption: &str) -> String {
    match objects {
        [] => caption_fallback(caption),
        [only] => capitalize(only),
        [first, second, ..] => capitalize(&format!("{}_{}", first, second)),
    }
}

/// The two longest caption words (longer than three chars), kept in caption order
fn caption_fallback(caption: &str) -> String {
    let caption = caption.to_lowercase();
    let words: Vec<(usize, &str)> = caption
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .enumerate()
        .collect();

    if words.is_empty() {
        return GENERIC_CATEGORY.to_string();
    }

    let mut longest = words.clone();
    longest.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
    longest.truncate(2);
    longest.sort_by_key(|(position, _)| *position);

    let joined = longest
        .iter()
        .map(|(_, w)| *w)
        .collect::<Vec<_>>()
        .join("_");
    capitalize(&joined).chars().take(FALLBACK_MAX_CHARS).collect()
}

/// First character upper-cased, the rest lower-cased
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
