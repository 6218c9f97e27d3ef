use crate::reply::types::{Action, CarouselItem, ConfirmOption, OutboundMessage};

pub const WELCOME_TEXT: &str =
    "歡迎！輸入 confirm 查看確認視窗，輸入 carousel 查看輪播視窗，或直接問我任何問題。";
pub const STATIC_FALLBACK_TEXT: &str = "Thanks!";

pub fn welcome() -> OutboundMessage {
    OutboundMessage::text(WELCOME_TEXT)
}

pub fn static_fallback() -> OutboundMessage {
    OutboundMessage::text(STATIC_FALLBACK_TEXT)
}

pub fn confirmation() -> OutboundMessage {
    OutboundMessage::ConfirmationPrompt {
        alt_text: "這是確認視窗".to_string(),
        question: "你喜歡史迪奇嗎？".to_string(),
        options: [
            ConfirmOption {
                label: "是".to_string(),
                text: "你真棒!".to_string(),
            },
            ConfirmOption {
                label: "否".to_string(),
                text: "不!你喜歡史迪奇".to_string(),
            },
        ],
    }
}

pub fn carousel() -> OutboundMessage {
    OutboundMessage::Carousel {
        alt_text: "這是輪播視窗".to_string(),
        items: vec![
            movie_card(
                "https://upload.wikimedia.org/wikipedia/zh/4/4b/Big_Hero_6_%28film%29_poster.jpg",
                "大英雄天團",
                "可愛氣球杯麵主演的日本電影",
                "https://www.niusnews.com/=P312ww05",
                "我投杯麵一票",
            ),
            movie_card(
                "https://upload.wikimedia.org/wikipedia/zh/d/d0/Snow_White_2025_poster.jpg",
                "白雪公主",
                "童話故事改編電影",
                "https://meet.eslite.com/tw/tc/article/202504280001",
                "我投白雪公主一票",
            ),
        ],
    }
}

fn movie_card(
    image_url: &str,
    title: &str,
    body: &str,
    details_url: &str,
    vote: &str,
) -> CarouselItem {
    CarouselItem {
        image_url: image_url.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        actions: vec![
            Action::OpenLink {
                label: "查看詳情".to_string(),
                url: details_url.to_string(),
            },
            Action::SendText {
                label: "投票".to_string(),
                text: vote.to_string(),
            },
        ],
    }
}
