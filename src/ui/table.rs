use iced::widget::{button, column, container, image, row, scrollable, text, Column};
use iced::{Alignment, Element, Length};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::state::data::CaptureEntry;
use crate::Message;

const THUMBNAIL_SIDE: f32 = 50.0;

/// Entry table: thumbnail, latitude, longitude, date and time, action
pub fn entry_table<'a>(
    entries: &'a [CaptureEntry],
    thumbnails: &'a HashMap<String, PathBuf>,
) -> Element<'a, Message> {
    let header = row![
        header_cell("Image"),
        header_cell("Latitude"),
        header_cell("Longitude"),
        header_cell("Date and Time"),
        header_cell("Action"),
    ]
    .spacing(8)
    .padding([8, 16]);

    if entries.is_empty() {
        return column![header, text("No photos captured yet.").size(14)]
            .spacing(12)
            .into();
    }

    let rows = Column::with_children(
        entries
            .iter()
            .map(|entry| entry_row(entry, thumbnails.get(&entry.uri))),
    )
    .spacing(4);

    column![header, scrollable(rows).height(Length::Fill)]
        .spacing(4)
        .into()
}

fn entry_row<'a>(entry: &'a CaptureEntry, thumbnail: Option<&'a PathBuf>) -> Element<'a, Message> {
    // Fall back to the original photo until its thumbnail is ready
    let source = thumbnail
        .cloned()
        .unwrap_or_else(|| PathBuf::from(&entry.uri));
    let picture = container(
        image(image::Handle::from_path(source))
            .width(THUMBNAIL_SIDE)
            .height(THUMBNAIL_SIDE),
    )
    .width(Length::FillPortion(1));

    row![
        picture,
        cell(coordinate_label(entry.latitude)),
        cell(coordinate_label(entry.longitude)),
        cell(entry.formatted_time()),
        container(
            button(text("View on map").size(14))
                .on_press(Message::ShowOnMap(entry.clone()))
                .padding(8),
        )
        .width(Length::FillPortion(1)),
    ]
    .spacing(8)
    .padding([8, 16])
    .align_y(Alignment::Center)
    .into()
}

fn header_cell(label: &str) -> Element<'_, Message> {
    container(text(label).size(16))
        .width(Length::FillPortion(1))
        .into()
}

fn cell<'a>(value: String) -> Element<'a, Message> {
    container(text(value).size(14))
        .width(Length::FillPortion(1))
        .into()
}

/// Coordinate as shown in the table; absent values show a dash
pub fn coordinate_label(value: Option<f64>) -> String {
    match value {
        Some(degrees) => format!("{:.5}", degrees),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_label() {
        assert_eq!(coordinate_label(Some(12.9)), "12.90000");
        assert_eq!(coordinate_label(Some(-33.25)), "-33.25000");
        assert_eq!(coordinate_label(None), "—");
    }
}
