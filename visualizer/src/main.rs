use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Subscription,
    Task, Theme,
};
use serde::{Deserialize, Serialize};
use skyplotcore::processing::{AxisLabels, HorizontalAnchor, Marker, NormalizationDiagnostics};
use std::time::Duration;

const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";
const ANNOTATION_WIDTH: f32 = 325.0;
const ANNOTATION_HEIGHT: f32 = 54.0;

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Skyplot Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(2)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

fn bridge_url(path: &str) -> String {
    let base = std::env::var("SKYPLOT_BRIDGE").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.into());
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[derive(Debug)]
struct Visualizer {
    scenario: ScenarioForm,
    payload: Option<VisualizationPayload>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<VisualizationPayload, String>),
    ScenarioFieldChanged(ScenarioField, String),
    SubmitScenario,
    RequestRefresh,
    Submitted(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum ScenarioField {
    Flights,
    Seed,
    GroundedFraction,
    MissingFraction,
    Name,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                scenario: ScenarioForm::default(),
                payload: None,
                status: "Waiting for flight data...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_payload(), Message::PayloadFetched),
            Message::PayloadFetched(Ok(payload)) => {
                let changed = state.payload.as_ref().map(|p| p.snapshot_time)
                    != Some(payload.snapshot_time);
                state.status = if payload.empty {
                    "No usable flight data in this snapshot".into()
                } else {
                    format!(
                        "{} valid flights from {} total",
                        payload.diagnostics.accepted, payload.diagnostics.total
                    )
                };
                if changed {
                    state.push_history(format!(
                        "Snapshot {}: {} markers",
                        payload
                            .snapshot_time
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "n/a".into()),
                        payload.markers.len()
                    ));
                }
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::ScenarioFieldChanged(field, value) => {
                state.scenario.update_field(field, value);
                Task::none()
            }
            Message::SubmitScenario => {
                let payload = state.scenario.to_payload();
                Task::perform(post_scenario(payload), Message::Submitted)
            }
            Message::RequestRefresh => {
                state.status = "Fetching live snapshot...".into();
                Task::perform(post_refresh(), Message::Submitted)
            }
            Message::Submitted(Ok(message)) => {
                state.push_history(message.clone());
                state.status = message;
                Task::perform(fetch_payload(), Message::PayloadFetched)
            }
            Message::Submitted(Err(err)) => {
                state.status = format!("Request error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let labels = state.payload.as_ref().and_then(|p| p.labels.clone());
        let diagnostics = state
            .payload
            .as_ref()
            .map(|p| p.diagnostics)
            .unwrap_or_default();

        let label_column = match &labels {
            Some(labels) => column![
                text(labels.altitude.clone()).size(14),
                text(labels.speed.clone()).size(14),
                text(labels.legend.clone()).size(12),
            ],
            None => column![text("Axis ranges: n/a").size(14)],
        }
        .spacing(4);

        let scenario_column = column![
            text("Flight Data").size(26),
            button("Fetch live snapshot")
                .on_press(Message::RequestRefresh)
                .padding(10),
            text(&state.status).size(14),
            label_column,
            column![
                text("Record counts").size(16),
                text(format!("Total: {}", diagnostics.total)).size(12),
                text(format!("Accepted: {}", diagnostics.accepted)).size(12),
                text(format!("Missing altitude: {}", diagnostics.altitude_missing)).size(12),
                text(format!("Missing velocity: {}", diagnostics.ground_speed_missing)).size(12),
                text(format!("On ground: {}", diagnostics.grounded)).size(12),
            ]
            .spacing(4)
            .padding(6),
            text("Synthetic scenario").size(18),
            text_input("Flights", &state.scenario.flights)
                .on_input(|value| Message::ScenarioFieldChanged(ScenarioField::Flights, value))
                .padding(6),
            text_input("Seed", &state.scenario.seed)
                .on_input(|value| Message::ScenarioFieldChanged(ScenarioField::Seed, value))
                .padding(6),
            text_input("Grounded fraction", &state.scenario.grounded_fraction)
                .on_input(|value| {
                    Message::ScenarioFieldChanged(ScenarioField::GroundedFraction, value)
                })
                .padding(6),
            text_input("Missing fraction", &state.scenario.missing_fraction)
                .on_input(|value| {
                    Message::ScenarioFieldChanged(ScenarioField::MissingFraction, value)
                })
                .padding(6),
            text_input("Scenario name", &state.scenario.name)
                .on_input(|value| Message::ScenarioFieldChanged(ScenarioField::Name, value))
                .padding(6),
            button("POST scenario")
                .on_press(Message::SubmitScenario)
                .padding(10),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let plot = Canvas::new(PlotArea::new(state.payload.as_ref()))
            .width(Length::Fill)
            .height(Length::Fixed(500.0));

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let plot_column = column![
            text("Altitude vs. ground speed").size(26),
            text("Hover a marker for details").size(12),
            plot,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![scenario_column, plot_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_payload() -> Result<VisualizationPayload, String> {
    let response = reqwest::get(bridge_url("payload"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<VisualizationPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_json<T: Serialize>(path: &str, body: Option<&T>) -> Result<String, String> {
    let client = reqwest::Client::new();
    let mut request = client.post(bridge_url(path));
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let reply = response
        .json::<BridgeReply>()
        .await
        .map_err(|e| e.to_string())?;
    if status.is_success() {
        Ok(format!(
            "Rendered {} markers from {} records",
            reply.markers, reply.total
        ))
    } else {
        Err(format!("{}: {}", status, reply.message.unwrap_or_default()))
    }
}

async fn post_scenario(config: ScenarioConfig) -> Result<String, String> {
    post_json("ingest-config", Some(&config)).await
}

async fn post_refresh() -> Result<String, String> {
    post_json::<ScenarioConfig>("refresh", None).await
}

#[derive(Debug, Clone)]
struct ScenarioForm {
    flights: String,
    seed: String,
    grounded_fraction: String,
    missing_fraction: String,
    name: String,
}

impl ScenarioForm {
    fn default() -> Self {
        Self {
            flights: "400".into(),
            seed: "312".into(),
            grounded_fraction: "0.08".into(),
            missing_fraction: "0.05".into(),
            name: "Visualizer scenario".into(),
        }
    }

    fn update_field(&mut self, field: ScenarioField, value: String) {
        match field {
            ScenarioField::Flights => self.flights = value,
            ScenarioField::Seed => self.seed = value,
            ScenarioField::GroundedFraction => self.grounded_fraction = value,
            ScenarioField::MissingFraction => self.missing_fraction = value,
            ScenarioField::Name => self.name = value,
        }
    }

    fn to_payload(&self) -> ScenarioConfig {
        ScenarioConfig {
            flights: self.flights.parse().ok(),
            seed: self.seed.parse().ok(),
            grounded_fraction: self.grounded_fraction.parse().ok(),
            missing_fraction: self.missing_fraction.parse().ok(),
            scenario: if self.name.trim().is_empty() {
                None
            } else {
                Some(self.name.clone())
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ScenarioConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    flights: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grounded_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fraction: Option<f64>,
    scenario: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    markers: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct VisualizationPayload {
    #[serde(default)]
    plot_width: u32,
    #[serde(default)]
    plot_height: u32,
    #[serde(default)]
    marker_size: u32,
    #[serde(default)]
    snapshot_time: Option<i64>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(default)]
    labels: Option<AxisLabels>,
    #[serde(default)]
    diagnostics: NormalizationDiagnostics,
    #[serde(default)]
    empty: bool,
}

#[derive(Clone)]
struct PlotArea {
    width: f32,
    height: f32,
    marker_size: f32,
    markers: Vec<Marker>,
    empty: bool,
}

impl PlotArea {
    fn new(payload: Option<&VisualizationPayload>) -> Self {
        match payload {
            Some(payload) if payload.plot_width > 0 && payload.plot_height > 0 => {
                let mut markers = payload.markers.clone();
                markers.sort_by_key(|marker| marker.stack_order);
                Self {
                    width: payload.plot_width as f32,
                    height: payload.plot_height as f32,
                    marker_size: payload.marker_size.max(1) as f32,
                    markers,
                    empty: payload.empty,
                }
            }
            other => Self {
                width: 1000.0,
                height: 500.0,
                marker_size: 5.0,
                markers: Vec::new(),
                empty: other.map(|p| p.empty).unwrap_or(false),
            },
        }
    }

    /// Topmost marker under `cursor`, in logical plot coordinates.
    fn hovered(&self, cursor: Point) -> Option<&Marker> {
        self.markers.iter().rev().find(|marker| {
            let x = marker.screen_x as f32;
            let y = marker.screen_y as f32;
            cursor.x >= x
                && cursor.x <= x + self.marker_size
                && cursor.y >= y
                && cursor.y <= y + self.marker_size
        })
    }
}

fn label(content: String, position: Point, size: f32) -> canvas::Text {
    canvas::Text {
        content,
        position,
        color: Color::WHITE,
        size: Pixels(size),
        ..canvas::Text::default()
    }
}

impl canvas::Program<Message> for PlotArea {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.08),
        );

        let scale_x = bounds.width / self.width;
        let scale_y = bounds.height / self.height;

        let axes = Path::new(|builder| {
            builder.move_to(Point::new(0.0, 0.0));
            builder.line_to(Point::new(0.0, bounds.height));
            builder.line_to(Point::new(bounds.width, bounds.height));
        });
        frame.stroke(
            &axes,
            Stroke::default()
                .with_color(Color::from_rgb(0.35, 0.35, 0.45))
                .with_width(1.0),
        );

        if self.markers.is_empty() {
            let message = if self.empty {
                "No usable flight data in this snapshot"
            } else {
                "Waiting for flight data"
            };
            frame.fill_text(label(
                message.into(),
                Point::new(16.0, bounds.height / 2.0),
                16.0,
            ));
            return vec![frame.into_geometry()];
        }

        let marker_extent = Size::new(self.marker_size * scale_x, self.marker_size * scale_y);
        for marker in &self.markers {
            let color = Color::from_rgb8(marker.color.red, marker.color.green, marker.color.blue);
            frame.fill_rectangle(
                Point::new(
                    marker.screen_x as f32 * scale_x,
                    marker.screen_y as f32 * scale_y,
                ),
                marker_extent,
                color,
            );
        }

        let hovered = cursor
            .position_in(bounds)
            .map(|point| Point::new(point.x / scale_x, point.y / scale_y))
            .and_then(|point| self.hovered(point));

        if let Some(marker) = hovered {
            let top = (marker.screen_y as f32 * scale_y)
                .min(bounds.height - ANNOTATION_HEIGHT)
                .max(0.0);
            let left = match marker.anchor {
                HorizontalAnchor::Left => marker.screen_x as f32 * scale_x,
                HorizontalAnchor::Right => {
                    (self.width - marker.right_offset as f32) * scale_x - ANNOTATION_WIDTH
                }
            }
            .max(0.0);

            frame.fill_rectangle(
                Point::new(left, top),
                Size::new(ANNOTATION_WIDTH, ANNOTATION_HEIGHT),
                Color::from_rgba(0.1, 0.1, 0.15, 0.92),
            );
            let heading = marker
                .callsign
                .as_deref()
                .map(str::trim)
                .filter(|callsign| !callsign.is_empty())
                .unwrap_or("Unknown callsign");
            let lines = [heading, marker.annotation.trend.as_str(), marker.annotation.velocity.as_str()];
            for (idx, line) in lines.iter().enumerate() {
                frame.fill_text(label(
                    (*line).to_string(),
                    Point::new(left + 6.0, top + 4.0 + idx as f32 * 16.0),
                    13.0,
                ));
            }
        }

        vec![frame.into_geometry()]
    }
}
