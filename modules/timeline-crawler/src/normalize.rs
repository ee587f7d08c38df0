use std::sync::LazyLock;

use regex::Regex;

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());

/// Keycap sequences (`1️⃣`, `#️⃣`) as a whole, then pictographs plus the
/// joiners and modifiers that glue emoji sequences together (skin tones, ZWJ,
/// VS-16, flag and tag characters).
static RE_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[0-9#*]\x{FE0F}?\x{20E3}|[\p{Extended_Pictographic}\p{Emoji_Modifier}\p{Regional_Indicator}\x{200D}\x{FE0F}\x{20E3}\x{E0020}-\x{E007F}]",
    )
    .unwrap()
});

/// Clean captured post text: drop emoji and URLs, then trim the ends.
///
/// Emoji go first so a pictograph wedged inside a link (`http😀://…`) cannot
/// leave a fresh URL behind; this keeps `normalize` idempotent. Internal
/// whitespace is left as-is.
pub fn normalize(raw: &str) -> String {
    let without_emoji = RE_EMOJI.replace_all(raw, "");
    let without_urls = RE_URL.replace_all(&without_emoji, "");
    without_urls.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_url_and_emoji() {
        let out = normalize("check http://a.b/x 😀 text");
        assert_eq!(out, "check   text");
        assert!(!out.contains("http"));
        assert!(!out.contains('😀'));
    }

    #[test]
    fn strips_www_and_https_links() {
        assert_eq!(normalize("see www.example.com/a?b=1 now"), "see  now");
        assert_eq!(normalize("https://t.co/AbC123"), "");
    }

    #[test]
    fn strips_emoji_sequences() {
        // ZWJ family, skin tone, flag
        assert_eq!(normalize("가족 👨‍👩‍👧 손 👋🏽 국기 🇰🇷 끝"), "가족  손  국기  끝");
        assert_eq!(normalize("❤️유심"), "유심");
    }

    #[test]
    fn strips_keycap_sequences_whole() {
        assert_eq!(normalize("1\u{FE0F}\u{20E3} 순위 #\u{FE0F}\u{20E3} 태그"), "순위  태그");
        assert_eq!(normalize("*\u{20E3}별"), "별");
        assert_eq!(normalize("1위 #1 *중요*"), "1위 #1 *중요*");
    }

    #[test]
    fn keeps_korean_and_punctuation() {
        let text = "SKT 유심 교체 대기 중... (3시간째) #해킹";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("😀 🎉"), "");
    }

    #[test]
    fn idempotent_on_tricky_inputs() {
        let inputs = [
            "",
            "plain",
            "  padded  ",
            "check http://a.b/x 😀 text",
            "http😀://hidden.link after",
            "www😀.hidden.link",
            "😀 https://x.y 😀",
            "ends with link https://x.y\n",
            "링크 www.naver.com 🙏 감사",
            "\u{FE0F}\u{200D}",
            "1\u{FE0F}\u{20E3}#\u{20E3}",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn emoji_inside_scheme_does_not_survive_as_link() {
        assert_eq!(normalize("http😀://hidden.link after"), "after");
    }
}
