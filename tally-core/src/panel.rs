//! Metric panels
//!
//! A panel is one full-screen view: fetch a JSON document from a
//! service, pull one or two numbers out of it, draw them over a themed
//! background and hold the frame for the dwell time. The panel table
//! is data, not code; adding a service means adding a `PanelSpec`
//! with its URL, JSON paths and label positions.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::config::MAX_URL_LEN;
use crate::json::{self, PathError, PathStep, Value};
use crate::scene::{BackgroundSource, FontSize, Label, Scene, SceneError, MAX_LABEL_TEXT};
use crate::status::StatusColor;
use crate::traits::board::{AmbientSensor, SensorError};
use crate::traits::frame::Frame;
use crate::traits::http::{read_body, HttpClient, HttpError, HttpResponse};
use crate::traits::led::StatusLed;

/// Fields per panel (YouTube shows views and subscribers at once)
pub const MAX_FIELDS: usize = 2;

/// Largest response body a panel will buffer
pub const MAX_BODY_BYTES: usize = 32 * 1024;

/// Path to the star count in a GitHub repo document
pub const GITHUB_STARS: &[PathStep<'static>] = &[PathStep::Key("stargazers_count")];

/// Path to the subscriber count in a subreddit about document
pub const REDDIT_SUBSCRIBERS: &[PathStep<'static>] =
    &[PathStep::Key("data"), PathStep::Key("subscribers")];

/// Path to the follower count in the Twitter follow-button document
pub const TWITTER_FOLLOWERS: &[PathStep<'static>] =
    &[PathStep::Index(0), PathStep::Key("followers_count")];

/// Path to the view count in a YouTube channel statistics document
pub const YOUTUBE_VIEWS: &[PathStep<'static>] = &[
    PathStep::Key("items"),
    PathStep::Index(0),
    PathStep::Key("statistics"),
    PathStep::Key("viewCount"),
];

/// Path to the subscriber count in a YouTube channel statistics document
pub const YOUTUBE_SUBSCRIBERS: &[PathStep<'static>] = &[
    PathStep::Key("items"),
    PathStep::Index(0),
    PathStep::Key("statistics"),
    PathStep::Key("subscriberCount"),
];

/// One value to extract and where to draw it
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Path to the leaf inside the response document
    pub path: &'static [PathStep<'static>],
    pub x: u16,
    pub y: u16,
}

/// Panel background selection
#[derive(Debug, Clone, Copy)]
pub enum PanelBackground {
    /// Full-frame color fill (0xRRGGBB)
    Fill(u32),
    /// Themed BMP compiled into the firmware
    Asset(&'static [u8]),
}

/// One dashboard view
#[derive(Debug, Clone)]
pub struct PanelSpec {
    pub name: &'static str,
    pub url: String<MAX_URL_LEN>,
    pub fields: heapless::Vec<FieldSpec, MAX_FIELDS>,
    pub background: PanelBackground,
    /// Seconds the rendered panel stays on screen
    pub dwell_s: u32,
}

/// The values a panel rendered, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelReading {
    pub values: heapless::Vec<String<MAX_LABEL_TEXT>, MAX_FIELDS>,
}

/// Panel cycle failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    Http(HttpError),
    /// Service answered with a non-200 status
    BadStatus(u16),
    /// Body is not parseable JSON
    Json,
    /// Document shape did not match the panel's path
    Path(PathError),
    /// The leaf is neither an integer nor a string
    FieldType,
    Scene(SceneError),
    Sensor(SensorError),
}

impl From<HttpError> for PanelError {
    fn from(e: HttpError) -> Self {
        PanelError::Http(e)
    }
}

impl From<PathError> for PanelError {
    fn from(e: PathError) -> Self {
        PanelError::Path(e)
    }
}

impl From<SceneError> for PanelError {
    fn from(e: SceneError) -> Self {
        PanelError::Scene(e)
    }
}

/// Errors assembling a panel from config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelBuildError {
    /// A config key this panel needs is empty
    MissingKey(&'static str),
    /// Identifier or token pushed the URL past its capacity
    UrlTooLong,
}

fn build_url(args: core::fmt::Arguments<'_>) -> Result<String<MAX_URL_LEN>, PanelBuildError> {
    let mut url = String::new();
    url.write_fmt(args).map_err(|_| PanelBuildError::UrlTooLong)?;
    Ok(url)
}

fn require<'a>(value: &'a str, key: &'static str) -> Result<&'a str, PanelBuildError> {
    if value.is_empty() {
        Err(PanelBuildError::MissingKey(key))
    } else {
        Ok(value)
    }
}

/// GitHub repository star count
pub fn github_panel(
    repo: &str,
    token: &str,
    background: PanelBackground,
    dwell_s: u32,
) -> Result<PanelSpec, PanelBuildError> {
    let repo = require(repo, "github_repo")?;
    let token = require(token, "github_token")?;
    let url = build_url(format_args!(
        "https://api.github.com/repos/{repo}?access_token={token}"
    ))?;
    let mut fields = heapless::Vec::new();
    let _ = fields.push(FieldSpec {
        path: GITHUB_STARS,
        x: 200,
        y: 100,
    });
    Ok(PanelSpec {
        name: "github",
        url,
        fields,
        background,
        dwell_s,
    })
}

/// Subreddit subscriber count
pub fn reddit_panel(
    subreddit: &str,
    background: PanelBackground,
    dwell_s: u32,
) -> Result<PanelSpec, PanelBuildError> {
    let subreddit = require(subreddit, "subreddit")?;
    let url = build_url(format_args!(
        "https://www.reddit.com/r/{subreddit}/about.json"
    ))?;
    let mut fields = heapless::Vec::new();
    let _ = fields.push(FieldSpec {
        path: REDDIT_SUBSCRIBERS,
        x: 200,
        y: 100,
    });
    Ok(PanelSpec {
        name: "reddit",
        url,
        fields,
        background,
        dwell_s,
    })
}

/// Twitter follower count, via the unauthenticated follow-button CDN
pub fn twitter_panel(
    screen_name: &str,
    background: PanelBackground,
    dwell_s: u32,
) -> Result<PanelSpec, PanelBuildError> {
    let screen_name = require(screen_name, "twitter_user")?;
    let url = build_url(format_args!(
        "https://cdn.syndication.twimg.com/widgets/followbutton/info.json?screen_names={screen_name}"
    ))?;
    let mut fields = heapless::Vec::new();
    let _ = fields.push(FieldSpec {
        path: TWITTER_FOLLOWERS,
        x: 200,
        y: 100,
    });
    Ok(PanelSpec {
        name: "twitter",
        url,
        fields,
        background,
        dwell_s,
    })
}

/// YouTube channel views and subscribers on one screen
pub fn youtube_panel(
    channel_id: &str,
    token: &str,
    background: PanelBackground,
    dwell_s: u32,
) -> Result<PanelSpec, PanelBuildError> {
    let channel_id = require(channel_id, "youtube_channel")?;
    let token = require(token, "youtube_token")?;
    let url = build_url(format_args!(
        "https://www.googleapis.com/youtube/v3/channels?part=statistics&id={channel_id}&key={token}"
    ))?;
    let mut fields = heapless::Vec::new();
    let _ = fields.push(FieldSpec {
        path: YOUTUBE_VIEWS,
        x: 160,
        y: 90,
    });
    let _ = fields.push(FieldSpec {
        path: YOUTUBE_SUBSCRIBERS,
        x: 160,
        y: 150,
    });
    Ok(PanelSpec {
        name: "youtube",
        url,
        fields,
        background,
        dwell_s,
    })
}

/// Render the leaf value as label text.
///
/// Integers and strings are the only shapes the services hand back;
/// anything else means the panel's path landed on the wrong node.
fn field_text(value: &Value) -> Result<String<MAX_LABEL_TEXT>, PanelError> {
    let mut out = String::new();
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                write!(out, "{u}").map_err(|_| PanelError::FieldType)?;
            } else if let Some(i) = n.as_i64() {
                write!(out, "{i}").map_err(|_| PanelError::FieldType)?;
            } else {
                return Err(PanelError::FieldType);
            }
        }
        Value::String(s) => {
            for c in s.chars() {
                if out.push(c).is_err() {
                    break;
                }
            }
        }
        _ => return Err(PanelError::FieldType),
    }
    Ok(out)
}

fn background_source(background: PanelBackground) -> BackgroundSource {
    match background {
        PanelBackground::Fill(color) => BackgroundSource::Fill(color),
        PanelBackground::Asset(bytes) => BackgroundSource::Data(bytes),
    }
}

/// Run one panel cycle: fetch, extract, render, dwell.
///
/// The overlay stack is restored to its starting depth on every exit
/// path, so a failed cycle leaves no stale labels behind.
pub fn show_panel<C, F, L, D>(
    panel: &PanelSpec,
    http: &mut C,
    scene: &mut Scene,
    surface: &mut F,
    led: &mut L,
    delay: &mut D,
) -> Result<PanelReading, PanelError>
where
    C: HttpClient,
    F: Frame,
    L: StatusLed,
    D: DelayNs,
{
    let base = scene.overlay_count();
    match fetch_and_render(panel, http, scene, surface, led) {
        Ok(reading) => {
            delay.delay_ms(panel.dwell_s.saturating_mul(1_000));
            scene.truncate_overlays(base);
            Ok(reading)
        }
        Err(e) => {
            scene.truncate_overlays(base);
            Err(e)
        }
    }
}

fn fetch_and_render<C, F, L>(
    panel: &PanelSpec,
    http: &mut C,
    scene: &mut Scene,
    surface: &mut F,
    led: &mut L,
) -> Result<PanelReading, PanelError>
where
    C: HttpClient,
    F: Frame,
    L: StatusLed,
{
    led.fill(StatusColor::FETCHING);
    let mut response = http.get(panel.url.as_str())?;
    led.fill(StatusColor::RECEIVED);

    let status = response.status();
    if status != 200 {
        led.fill(StatusColor::OFF);
        return Err(PanelError::BadStatus(status));
    }

    let body = read_body(&mut response, MAX_BODY_BYTES)?;
    drop(response);
    led.fill(StatusColor::OFF);

    let doc: Value = serde_json::from_slice(&body).map_err(|_| PanelError::Json)?;

    let mut reading = PanelReading::default();
    for field in &panel.fields {
        let leaf = json::resolve(&doc, field.path)?;
        let text = field_text(leaf)?;
        scene.push_overlay(Label::new(text.as_str(), field.x, field.y))?;
        let _ = reading.values.push(text);
    }

    scene.set_background(background_source(panel.background), surface)?;
    Ok(reading)
}

/// Ambient readings panel; no network involved
#[derive(Debug, Clone)]
pub struct SensorPanelSpec {
    pub name: &'static str,
    pub background: PanelBackground,
    pub dwell_s: u32,
    /// Where the temperature label lands
    pub temperature_pos: (u16, u16),
    /// Where the light label lands
    pub light_pos: (u16, u16),
}

impl SensorPanelSpec {
    pub fn new(background: PanelBackground, dwell_s: u32) -> Self {
        Self {
            name: "ambient",
            background,
            dwell_s,
            temperature_pos: (160, 90),
            light_pos: (160, 150),
        }
    }
}

/// Format tenths of a degree as e.g. `23.4C` / `-12.3C`
fn temperature_text(dc: i16) -> Result<String<MAX_LABEL_TEXT>, PanelError> {
    let mut out = String::new();
    let sign = if dc < 0 { "-" } else { "" };
    let dc = (dc as i32).abs();
    write!(out, "{sign}{}.{}C", dc / 10, dc % 10).map_err(|_| PanelError::FieldType)?;
    Ok(out)
}

/// Render the ambient sensor panel and dwell.
pub fn show_sensor_panel<S, F, D>(
    panel: &SensorPanelSpec,
    sensor: &mut S,
    scene: &mut Scene,
    surface: &mut F,
    delay: &mut D,
) -> Result<PanelReading, PanelError>
where
    S: AmbientSensor,
    F: Frame,
    D: DelayNs,
{
    let base = scene.overlay_count();
    match render_sensor(panel, sensor, scene, surface) {
        Ok(reading) => {
            delay.delay_ms(panel.dwell_s.saturating_mul(1_000));
            scene.truncate_overlays(base);
            Ok(reading)
        }
        Err(e) => {
            scene.truncate_overlays(base);
            Err(e)
        }
    }
}

fn render_sensor<S, F>(
    panel: &SensorPanelSpec,
    sensor: &mut S,
    scene: &mut Scene,
    surface: &mut F,
) -> Result<PanelReading, PanelError>
where
    S: AmbientSensor,
    F: Frame,
{
    let dc = sensor.temperature_dc().map_err(PanelError::Sensor)?;
    let light = sensor.light_raw().map_err(PanelError::Sensor)?;

    let temp_text = temperature_text(dc)?;
    let mut light_text: String<MAX_LABEL_TEXT> = String::new();
    write!(light_text, "{light}").map_err(|_| PanelError::FieldType)?;

    let mut reading = PanelReading::default();
    scene.push_overlay(
        Label::new(
            temp_text.as_str(),
            panel.temperature_pos.0,
            panel.temperature_pos.1,
        )
        .with_font(FontSize::Large),
    )?;
    scene.push_overlay(Label::new(
        light_text.as_str(),
        panel.light_pos.0,
        panel.light_pos.1,
    ))?;
    let _ = reading.values.push(temp_text);
    let _ = reading.values.push(light_text);

    scene.set_background(background_source(panel.background), surface)?;
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingFrame, FakeHttp, FakeLed, FakeResponse, FakeSensor, NoDelay};

    fn github_fixture(url_token: &str) -> PanelSpec {
        github_panel(
            "owner/project",
            url_token,
            PanelBackground::Fill(0x202020),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_github_panel_renders_star_count() {
        let panel = github_fixture("tok");
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(br#"{"stargazers_count": 42, "forks": 7}"#),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let reading =
            show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
                .unwrap();

        assert_eq!(reading.values[0].as_str(), "42");
        // Label was on screen at present time, then cleaned up
        assert_eq!(surface.last_overlay_texts, ["42"]);
        assert_eq!(surface.last_background_count, 1);
        assert_eq!(scene.overlay_count(), 0);
        assert_eq!(scene.background_count(), 1);
        assert_eq!(surface.presents, 1);
    }

    #[test]
    fn test_panel_url_carries_token() {
        let panel = github_fixture("sekrit");
        assert_eq!(
            panel.url.as_str(),
            "https://api.github.com/repos/owner/project?access_token=sekrit"
        );
    }

    #[test]
    fn test_missing_token_fails_construction() {
        let err = github_panel("owner/project", "", PanelBackground::Fill(0), 60).unwrap_err();
        assert_eq!(err, PanelBuildError::MissingKey("github_token"));
    }

    #[test]
    fn test_string_leaf_renders_verbatim() {
        let panel = youtube_panel("UCabc", "key", PanelBackground::Fill(0), 0).unwrap();
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(
                br#"{"items":[{"statistics":{"viewCount":"500","subscriberCount":"77"}}]}"#,
            ),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let reading =
            show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
                .unwrap();

        assert_eq!(reading.values[0].as_str(), "500");
        assert_eq!(reading.values[1].as_str(), "77");
        assert_eq!(surface.last_overlay_texts, ["500", "77"]);
    }

    #[test]
    fn test_non_200_is_reported_not_rendered() {
        let panel = github_fixture("tok");
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(b"rate limited").with_status(403),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let err = show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
            .unwrap_err();

        assert_eq!(err, PanelError::BadStatus(403));
        assert_eq!(surface.presents, 0);
        assert_eq!(scene.overlay_count(), 0);
    }

    #[test]
    fn test_shape_drift_cleans_up_overlays() {
        // Two-field panel where the second path misses: the first
        // field's label must not leak onto the overlay stack.
        let panel = youtube_panel("UCabc", "key", PanelBackground::Fill(0), 0).unwrap();
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(br#"{"items":[{"statistics":{"viewCount":"500"}}]}"#),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let err = show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
            .unwrap_err();

        assert_eq!(err, PanelError::Path(crate::json::PathError::MissingKey));
        assert_eq!(scene.overlay_count(), 0);
        assert_eq!(surface.presents, 0);
    }

    #[test]
    fn test_garbage_body_is_a_json_error() {
        let panel = github_fixture("tok");
        let mut http = FakeHttp::new();
        http.route(panel.url.as_str(), FakeResponse::ok(b"<html>oops</html>"));
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let err = show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
            .unwrap_err();
        assert_eq!(err, PanelError::Json);
    }

    #[test]
    fn test_boolean_leaf_is_a_field_type_error() {
        let panel = github_fixture("tok");
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(br#"{"stargazers_count": true}"#),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        let err = show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay)
            .unwrap_err();
        assert_eq!(err, PanelError::FieldType);
    }

    #[test]
    fn test_led_sequence_over_a_cycle() {
        let panel = github_fixture("tok");
        let mut http = FakeHttp::new();
        http.route(
            panel.url.as_str(),
            FakeResponse::ok(br#"{"stargazers_count": 1}"#),
        );
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();
        let mut led = FakeLed::new();

        show_panel(&panel, &mut http, &mut scene, &mut surface, &mut led, &mut NoDelay).unwrap();

        assert_eq!(
            &*led.fills.borrow(),
            &[
                StatusColor::FETCHING,
                StatusColor::RECEIVED,
                StatusColor::OFF
            ]
        );
    }

    #[test]
    fn test_sensor_panel_formats_readings() {
        let spec = SensorPanelSpec::new(PanelBackground::Fill(0x101010), 0);
        let mut sensor = FakeSensor::fixed(234, 812);
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();

        let reading =
            show_sensor_panel(&spec, &mut sensor, &mut scene, &mut surface, &mut NoDelay).unwrap();

        assert_eq!(reading.values[0].as_str(), "23.4C");
        assert_eq!(reading.values[1].as_str(), "812");
        assert_eq!(surface.last_overlay_texts, ["23.4C", "812"]);
        assert_eq!(scene.overlay_count(), 0);
    }

    #[test]
    fn test_sensor_panel_negative_temperature() {
        let spec = SensorPanelSpec::new(PanelBackground::Fill(0), 0);
        let mut sensor = FakeSensor::fixed(-123, 0);
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();

        let reading =
            show_sensor_panel(&spec, &mut sensor, &mut scene, &mut surface, &mut NoDelay).unwrap();
        assert_eq!(reading.values[0].as_str(), "-12.3C");
    }

    #[test]
    fn test_sensor_failure_is_reported() {
        let spec = SensorPanelSpec::new(PanelBackground::Fill(0), 0);
        let mut sensor = FakeSensor::broken();
        let mut scene = Scene::new();
        let mut surface = CountingFrame::new();

        let err = show_sensor_panel(&spec, &mut sensor, &mut scene, &mut surface, &mut NoDelay)
            .unwrap_err();
        assert_eq!(err, PanelError::Sensor(SensorError::Bus));
        assert_eq!(surface.presents, 0);
    }
}
