/// Screen building blocks
///
/// - Entry table (table.rs)
/// - Map view for the selected entry (map.rs)

pub mod map;
pub mod table;

use iced::widget::{container, text};
use iced::{Background, Border, Color, Element, Length};

use crate::Message;

/// Transient notification banner
pub fn notice(message: &str) -> Element<'_, Message> {
    container(text(message).size(14).color(Color::WHITE))
        .padding([8, 12])
        .width(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Background::Color(Color {
                r: 0.55,
                g: 0.18,
                b: 0.18,
                a: 0.95,
            })),
            border: Border {
                radius: 6.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}
