use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));
static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex"));

/// Map a lower-case Vietnamese letter to its base Latin letter
fn transliterate(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ắ' | 'ằ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ấ' | 'ầ' | 'ẩ'
        | 'ẫ' | 'ậ' => 'a',
        'đ' => 'd',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ế' | 'ề' | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ố' | 'ồ' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ớ' | 'ờ' | 'ở'
        | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ứ' | 'ừ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        other => other,
    }
}

/// Turn a human-readable title into a URL slug.
///
/// Upper-case input is lowered first, so `Đ` and the capital vowel forms
/// are covered by the lower-case table. Never fails; input with nothing
/// slug-worthy yields an empty string.
pub fn generate_slug(text: &str) -> String {
    let transliterated: String = text.to_lowercase().chars().map(transliterate).collect();
    let stripped = DISALLOWED.replace_all(&transliterated, "");
    let hyphenated = WHITESPACE.replace_all(&stripped, "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    VALID_SLUG.is_match(slug)
}

/// Slug input state for a create/edit form.
///
/// Follows the title only for new records whose slug was never typed by hand.
#[derive(Debug, Clone, Default)]
pub struct SlugField {
    value: String,
    follows_title: bool,
}

impl SlugField {
    pub fn for_new_record() -> Self {
        Self {
            value: String::new(),
            follows_title: true,
        }
    }

    pub fn for_existing(slug: impl Into<String>) -> Self {
        Self {
            value: slug.into(),
            follows_title: false,
        }
    }

    pub fn on_title_change(&mut self, title: &str) {
        if self.follows_title {
            self.value = generate_slug(title);
        }
    }

    pub fn on_manual_edit(&mut self, slug: impl Into<String>) {
        self.value = slug.into();
        self.follows_title = false;
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vietnamese_title() {
        assert_eq!(generate_slug("Sách Tâm Lý"), "sach-tam-ly");
        assert_eq!(generate_slug("Phân tích kỹ thuật BTC"), "phan-tich-ky-thuat-btc");
        assert_eq!(generate_slug("Đường Đi Của Giá"), "duong-di-cua-gia");
        assert_eq!(generate_slug("Quản lý vốn & rủi ro"), "quan-ly-von-rui-ro");
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(generate_slug("   "), "");
        assert_eq!(generate_slug(""), "");
        assert_eq!(generate_slug("!!! ???"), "");
    }

    #[test]
    fn test_hyphen_runs_and_edges() {
        assert_eq!(generate_slug("  --Hello   World--  "), "hello-world");
        assert_eq!(generate_slug("a - b"), "a-b");
        assert_eq!(generate_slug("EUR/USD 2024"), "eurusd-2024");
    }

    #[test]
    fn test_output_shape_and_idempotency() {
        let inputs = [
            "Sách Tâm Lý",
            "  Ước mơ của Trader!! ",
            "XAU — London session",
            "Tuần 12: Lợi nhuận +5%",
            "ỳ ý ỷ ỹ ỵ",
            "---",
        ];
        for input in inputs {
            let slug = generate_slug(input);
            assert!(slug.is_empty() || is_valid_slug(&slug), "bad slug {:?} from {:?}", slug, input);
            assert_eq!(generate_slug(&slug), slug);
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("sach-tam-ly"));
        assert!(is_valid_slug("btc2024"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("Upper"));
    }

    #[test]
    fn test_slug_field_follows_title_until_edited() {
        let mut field = SlugField::for_new_record();
        field.on_title_change("Nhật ký giao dịch");
        assert_eq!(field.value(), "nhat-ky-giao-dich");

        field.on_manual_edit("nhat-ky");
        field.on_title_change("Nhật ký giao dịch tuần 3");
        assert_eq!(field.value(), "nhat-ky");
    }

    #[test]
    fn test_slug_field_existing_record_never_overwritten() {
        let mut field = SlugField::for_existing("bai-viet-cu");
        field.on_title_change("Tiêu đề mới");
        assert_eq!(field.value(), "bai-viet-cu");
    }
}
