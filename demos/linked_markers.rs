//! Two stacked axes with linked markers. The lower axes carries a twin y-axis.
//!
//! Click to place a marker, shift-click to add another, drag to move the active one.
//! Arrow keys step the active marker; delete removes it.
use iced_markers::message::MarkerMessage;
use iced_markers::{Color, Curve, MarkerOption, MarkerPlot, MarkerPlotBuilder};

use iced::widget::{button, column, row, text};
use iced::{Element, Length};

fn main() -> iced::Result {
    iced::application(App::new, App::update, App::view).run()
}

struct App {
    plot: MarkerPlot,
}

#[derive(Debug, Clone)]
enum Message {
    Plot(MarkerMessage),
    Clear,
}

impl App {
    fn update(&mut self, message: Message) {
        match message {
            Message::Plot(msg) => self.plot.update(msg),
            Message::Clear => self.plot.update(MarkerMessage::RemoveAll),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        column![
            row![
                button("Remove markers").on_press(Message::Clear),
                text("click: place  shift+click: add  arrows: step  delete: remove"),
            ]
            .spacing(12),
            self.plot.view().map(Message::Plot),
        ]
        .spacing(8)
        .padding(8)
        .width(Length::Fill)
        .into()
    }

    fn new() -> Self {
        let x1: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let sin: Vec<f64> = x1.iter().map(|x| (x * 0.5).sin()).collect();

        let x2: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
        let cos: Vec<f64> = x2.iter().map(|x| (x * 0.3).cos() + 0.5).collect();
        let ramp: Vec<f64> = x2.iter().map(|x| x * 40.0).collect();

        let plot = MarkerPlotBuilder::new()
            .grid(2, 1)
            .add_twin_x(1)
            .add_curve(0, Curve::from_xy(&x1, &sin).with_label("sine"))
            .add_curve(
                1,
                Curve::from_xy(&x2, &cos)
                    .with_label("cosine")
                    .with_color(Color::from_rgb(0.9, 0.3, 0.3)),
            )
            .add_curve(
                2,
                Curve::from_xy(&x2, &ramp)
                    .with_label("ramp")
                    .with_color(Color::from_rgb(0.3, 0.9, 0.3)),
            )
            .with_y_lim(0, -1.5, 1.5)
            .with_link_all()
            .with_option(MarkerOption::ShowIndexLabel(true))
            .with_marker(0, 2.0)
            .build()
            .unwrap();

        Self { plot }
    }
}
