/// Map view for a selected capture
/// Draws a coordinate grid around the region center and one pin per marker
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::{Marker, Region};
use crate::device::Coordinates;
use crate::Message;

/// Grid lines per axis
const GRID_DIVISIONS: u32 = 4;

const BACKGROUND: Color = Color {
    r: 0.85,
    g: 0.89,
    b: 0.84,
    a: 1.0,
};
const GRID: Color = Color {
    r: 0.70,
    g: 0.75,
    b: 0.70,
    a: 1.0,
};
const PIN: Color = Color {
    r: 0.86,
    g: 0.16,
    b: 0.16,
    a: 1.0,
};
const LABEL: Color = Color {
    r: 0.15,
    g: 0.15,
    b: 0.15,
    a: 1.0,
};

pub struct MapView {
    pub region: Region,
    pub markers: Vec<Marker>,
}

impl Program<Message> for MapView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let size = bounds.size();

        frame.fill_rectangle(Point::ORIGIN, size, BACKGROUND);

        let mut grid = canvas::path::Builder::new();
        for i in 1..GRID_DIVISIONS {
            let t = i as f32 / GRID_DIVISIONS as f32;
            grid.move_to(Point::new(size.width * t, 0.0));
            grid.line_to(Point::new(size.width * t, size.height));
            grid.move_to(Point::new(0.0, size.height * t));
            grid.line_to(Point::new(size.width, size.height * t));
        }
        frame.stroke(&grid.build(), Stroke::default().with_color(GRID).with_width(1.0));

        for marker in &self.markers {
            let at = project(marker.coordinates, &self.region, size);

            frame.stroke(
                &Path::line(Point::new(at.x, at.y - 22.0), at),
                Stroke::default().with_color(PIN).with_width(2.0),
            );
            frame.fill(&Path::circle(Point::new(at.x, at.y - 22.0), 8.0), PIN);
            frame.fill_text(canvas::Text {
                content: marker.title.clone(),
                position: Point::new(at.x + 12.0, at.y - 30.0),
                color: LABEL,
                size: Pixels(14.0),
                ..canvas::Text::default()
            });
        }

        frame.fill_text(canvas::Text {
            content: format!(
                "{:.5}, {:.5}",
                self.region.center.latitude, self.region.center.longitude
            ),
            position: Point::new(8.0, size.height - 22.0),
            color: LABEL,
            size: Pixels(13.0),
            ..canvas::Text::default()
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        // Presses on the map belong to the map, not to the outside-tap handler
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left))
                if cursor.is_over(bounds) =>
            {
                (canvas::event::Status::Captured, None)
            }
            _ => (canvas::event::Status::Ignored, None),
        }
    }
}

/// Position of `coordinates` inside a canvas of `size` showing `region`.
/// North is up; the region center lands in the middle.
pub fn project(coordinates: Coordinates, region: &Region, size: Size) -> Point {
    let west = region.center.longitude - region.longitude_delta / 2.0;
    let north = region.center.latitude + region.latitude_delta / 2.0;

    let x = (coordinates.longitude - west) / region.longitude_delta;
    let y = (north - coordinates.latitude) / region.latitude_delta;

    Point::new(x as f32 * size.width, y as f32 * size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::around(Coordinates {
            latitude: 12.9,
            longitude: 77.6,
        })
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 0.01 && (a.y - b.y).abs() < 0.01
    }

    #[test]
    fn test_center_projects_to_middle() {
        let size = Size::new(400.0, 300.0);
        let at = project(region().center, &region(), size);
        assert!(close(at, Point::new(200.0, 150.0)));
    }

    #[test]
    fn test_north_east_corner() {
        let r = region();
        let corner = Coordinates {
            latitude: r.center.latitude + r.latitude_delta / 2.0,
            longitude: r.center.longitude + r.longitude_delta / 2.0,
        };
        let at = project(corner, &r, Size::new(400.0, 300.0));
        assert!(close(at, Point::new(400.0, 0.0)));
    }
}
