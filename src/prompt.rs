use serde::Serialize;

/// A cover style: base image prompt plus the caption suggested in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub default_text: &'static str,
    #[serde(skip)]
    pub prompt: &'static str,
}

/// Theme prompt, with the caption appended as the calligraphy centerpiece when non-blank.
pub fn build_prompt(theme: &Theme, caption: &str) -> String {
    let caption = caption.trim();
    if caption.is_empty() {
        return theme.prompt.to_string();
    }
    format!(
        "{}, with elegant Chinese calligraphy text \"{caption}\" as the prominent centerpiece",
        theme.prompt
    )
}

pub fn themes() -> &'static [Theme] {
    THEMES
}

pub fn find_theme(id: &str) -> Option<&'static Theme> {
    let id = id.trim();
    THEMES.iter().find(|theme| theme.id == id)
}

static THEMES: &[Theme] = &[
    Theme {
        id: "guochao-horse",
        name: "国潮鎏金",
        emoji: "🐴",
        default_text: "马到成功",
        prompt: "WeChat red packet cover design, golden embossed horse galloping through auspicious clouds, gilded gold craft texture, deep crimson red background with golden cloud patterns, Chinese Guochao national trend style, luxurious and noble, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "cute-horse",
        name: "3D萌马",
        emoji: "🧸",
        default_text: "新年快乐",
        prompt: "WeChat red packet cover design, adorable white fluffy plush baby horse sitting on golden ingot, red scarf, red lanterns hanging above, golden particles and confetti, warm golden background, 3D render C4D style, soft lighting, cute kawaii, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "starry-horse",
        name: "星河天马",
        emoji: "🌌",
        default_text: "前程似锦",
        prompt: "WeChat red packet cover design, majestic pink-purple horse galloping through galaxy starry sky, shooting stars, sparkling nebula, dreamy pink purple gradient background, fantasy magical atmosphere, romantic and ethereal, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "ink-horse",
        name: "水墨骏马",
        emoji: "🎨",
        default_text: "一马当先",
        prompt: "WeChat red packet cover design, ink wash painting style horse galloping powerfully, splashing ink dynamic motion, fireworks in background, traditional Chinese brush painting meets modern illustration, red and gold accents on ink black, majestic and bold, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "papercut-horse",
        name: "剪纸皮影",
        emoji: "🏮",
        default_text: "万事如意",
        prompt: "WeChat red packet cover design, multi-layer paper cutting art style, Chinese traditional palace background, red paper-cut horse with golden floral patterns, intricate paper craft, traditional Chinese folk art, festive and refined, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "fortune-horse",
        name: "马上有钱",
        emoji: "💰",
        default_text: "恭喜发财",
        prompt: "WeChat red packet cover design, cute golden cartoon horse carrying treasure bag and gold ingots, festive red background, auspicious clouds, hanging lanterns, Guochao illustration style, cheerful and prosperous, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "birthday",
        name: "生日",
        emoji: "🎂",
        default_text: "生日快乐",
        prompt: "WeChat red packet cover design, birthday celebration theme, colorful confetti, balloons, warm pink and gold tones, joyful festive atmosphere, sparkles and stars, flat illustration style, clean composition, no text no words, vertical 3:4 aspect ratio, high quality",
    },
    Theme {
        id: "wedding",
        name: "婚礼",
        emoji: "💍",
        default_text: "百年好合",
        prompt: "WeChat red packet cover design, Chinese wedding theme, double happiness symbol, red and gold luxurious, peony flowers, phoenix and dragon motifs, elegant romantic atmosphere, flat illustration, clean design, no text no words, vertical 3:4 aspect ratio, high quality",
    },
];
