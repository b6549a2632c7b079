//! Tally - Smart Dashboard Firmware
//!
//! Main firmware binary for the ESP32-S3 dashboard board: a wall
//! display that rotates through social metric panels fetched over
//! Wi-Fi, with an RGB status LED as the network heartbeat.

#![no_std]
#![no_main]

extern crate alloc;

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embedded_hal_bus::i2c::RefCellDevice as I2cDevice;
use embedded_hal_bus::spi::RefCellDevice as SpiDevice;
use embedded_sdmmc::{SdCard, VolumeManager};
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::interrupt::Priority;
use esp_hal::ledc::{channel, timer, LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use esp_rtos::embassy::InterruptExecutor;
use log::{info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{Orientation, Rotation};
use mipidsi::Builder as MipidsiBuilder;
use static_cell::StaticCell;

use tally_core::bringup::bring_up;
use tally_core::carousel::{Carousel, CycleOutcome, PanelEntry};
use tally_core::download::{fetch_background, DEFAULT_BLOCK_SIZE, TEMP_IMAGE_PATH};
use tally_core::panel::{
    github_panel, reddit_panel, twitter_panel, youtube_panel, PanelBackground, SensorPanelSpec,
};
use tally_core::scene::Scene;
use tally_core::traits::board::TouchInput;
use tally_display::EgSurface;

use crate::board::display::Tft;
use crate::board::led::{PwmBacklight, RgbStatusLed};
use crate::board::sensor::{AmbientBoard, SpeakerAmp, TouchProbe};
use crate::board::storage::{FixedTime, SdStorage};
use crate::channels::{CycleSummary, CYCLE_LOG};
use crate::net::{EspRadio, TcpHttpClient, RX_BUFFER_BYTES, TX_BUFFER_BYTES};

mod board;
mod channels;
mod config;
mod net;

esp_bootloader_esp_idf::esp_app_desc!();

// Heap size: TOML parsing, JSON documents and downloaded images
const HEAP_SIZE: usize = 96 * 1024;

const GITHUB_BG: &[u8] = include_bytes!("../assets/github.bmp");
const REDDIT_BG: &[u8] = include_bytes!("../assets/reddit.bmp");
const TWITTER_BG: &[u8] = include_bytes!("../assets/twitter.bmp");
const YOUTUBE_BG: &[u8] = include_bytes!("../assets/youtube.bmp");
const AMBIENT_BG: &[u8] = include_bytes!("../assets/ambient.bmp");

static RADIO_INIT: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static NET_EXECUTOR: StaticCell<InterruptExecutor<0>> = StaticCell::new();
static HTTP_RX_BUFFER: StaticCell<[u8; RX_BUFFER_BYTES]> = StaticCell::new();
static HTTP_TX_BUFFER: StaticCell<[u8; TX_BUFFER_BYTES]> = StaticCell::new();
static DISPLAY_SPI_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    info!("Tally firmware starting...");

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);
    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timer_group = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timer_group.timer0);

    // Radio and network stack; the runner lives on the interrupt
    // executor so the blocking dashboard loop cannot starve it
    let radio_init = RADIO_INIT.init(esp_radio::init().expect("radio init failed"));
    let (controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("wifi init failed");

    let resources = NET_RESOURCES.init(StackResources::new());
    let net_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, runner) = embassy_net::new(interfaces.sta, net_config, resources, 1024);

    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    let net_executor = NET_EXECUTOR.init(InterruptExecutor::new(sw_ints.software_interrupt0));
    let net_spawner = net_executor.start(Priority::Priority2);
    net_spawner.spawn(net_task(runner)).expect("spawn net task");
    net_spawner.spawn(log_task()).expect("spawn log task");

    // Status LED and backlight share one LEDC timer
    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    let mut pwm_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    pwm_timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty8Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_khz(24),
        })
        .expect("ledc timer config");

    let mut led_red = ledc.channel(channel::Number::Channel0, peripherals.GPIO4);
    let mut led_green = ledc.channel(channel::Number::Channel1, peripherals.GPIO5);
    let mut led_blue = ledc.channel(channel::Number::Channel2, peripherals.GPIO6);
    let mut backlight_channel = ledc.channel(channel::Number::Channel3, peripherals.GPIO45);
    for ch in [
        &mut led_red,
        &mut led_green,
        &mut led_blue,
        &mut backlight_channel,
    ] {
        ch.configure(channel::config::Config {
            timer: &pwm_timer,
            duty_pct: 0,
            pin_config: channel::config::PinConfig::PushPull,
        })
        .expect("ledc channel config");
    }
    let mut led = RgbStatusLed::new(led_red, led_green, led_blue);
    let mut backlight = PwmBacklight::new(backlight_channel);

    // One SPI bus for the TFT and the SD slot
    let spi_bus = RefCell::new(
        Spi::new(
            peripherals.SPI2,
            SpiConfig::default()
                .with_frequency(Rate::from_mhz(26))
                .with_mode(esp_hal::spi::Mode::_0),
        )
        .expect("spi init")
        .with_sck(peripherals.GPIO7)
        .with_mosi(peripherals.GPIO11)
        .with_miso(peripherals.GPIO13),
    );

    let cs_display = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let cs_sd = Output::new(peripherals.GPIO12, Level::High, OutputConfig::default());
    let display_spi = SpiDevice::new(&spi_bus, cs_display, Delay::new()).expect("display spi");
    let sd_spi = SpiDevice::new(&spi_bus, cs_sd, Delay::new()).expect("sd spi");

    let display_dc = Output::new(peripherals.GPIO9, Level::Low, OutputConfig::default());
    let display_rst = Output::new(peripherals.GPIO8, Level::High, OutputConfig::default());
    let display_buffer = DISPLAY_SPI_BUFFER.init([0u8; 512]);
    let display_interface = SpiInterface::new(display_spi, display_dc, display_buffer);
    let panel = MipidsiBuilder::new(ILI9341Rgb565, display_interface)
        .reset_pin(display_rst)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .init(&mut Delay::new())
        .expect("display init");
    let mut surface = EgSurface::new(Tft::new(panel));

    let sd_card = SdCard::new(sd_spi, Delay::new());
    let volume_manager = RefCell::new(VolumeManager::new(sd_card, FixedTime));
    let mut sd_storage = SdStorage::new(&volume_manager);

    // I2C bus: ambient sensor and touch controller
    let i2c_bus = RefCell::new(
        I2c::new(peripherals.I2C0, I2cConfig::default())
            .expect("i2c init")
            .with_sda(peripherals.GPIO1)
            .with_scl(peripherals.GPIO2),
    );
    let mut adc_config = AdcConfig::new();
    let light_pin = adc_config.enable_pin(peripherals.GPIO3, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);
    let mut sensor = AmbientBoard::new(I2cDevice::new(&i2c_bus), adc, light_pin);
    let mut touch = TouchProbe::new(I2cDevice::new(&i2c_bus));

    let speaker_enable = Output::new(peripherals.GPIO14, Level::Low, OutputConfig::default());
    let mut speaker = SpeakerAmp::new(speaker_enable);

    // Boot
    let dashboard_config = config::load();
    let mut radio = EspRadio::new(controller, stack);
    let mut scene = Scene::new();
    let mut delay = Delay::new();

    let report = loop {
        match bring_up(
            dashboard_config.capabilities,
            &dashboard_config.secrets,
            &mut radio,
            &mut scene,
            &mut surface,
            &mut led,
            &mut backlight,
            &mut delay,
            Some(&mut speaker),
            Some(&mut sd_storage),
            Some(&mut touch as &mut dyn TouchInput),
            Some(&mut sensor),
        ) {
            Ok(report) => break report,
            Err(e) => {
                // Unresponsive radio: hold, then try the whole
                // sequence again rather than boot a blank panel
                warn!("bring-up failed: {e:?}, retrying");
                embedded_hal::delay::DelayNs::delay_ms(&mut delay, 5_000);
            }
        }
    };
    info!(
        "bring-up complete: sd={} touch={} sensor={} join_attempts={}",
        report.sd_mounted, report.touch_ready, report.sensor_ready, report.join_attempts
    );

    let proxy_base = if dashboard_config.proxy_base.is_empty() {
        None
    } else {
        Some(dashboard_config.proxy_base.clone())
    };
    let mut http = TcpHttpClient::new(
        stack,
        HTTP_RX_BUFFER.init([0u8; RX_BUFFER_BYTES]),
        HTTP_TX_BUFFER.init([0u8; TX_BUFFER_BYTES]),
        proxy_base,
    );

    // Optional boot splash from the network, staged on the SD card
    if !dashboard_config.splash_url.is_empty() && report.sd_mounted {
        match fetch_background(
            dashboard_config.splash_url.as_str(),
            TEMP_IMAGE_PATH,
            &mut http,
            &mut sd_storage,
            &mut scene,
            &mut surface,
            &mut led,
            DEFAULT_BLOCK_SIZE,
            (0, 0),
        ) {
            Ok(()) => info!("splash installed"),
            Err(e) => {
                warn!("splash fetch failed: {e:?}");
                if let Some(hint) = e.operator_hint() {
                    warn!("{hint}");
                }
            }
        }
    }

    let carousel = build_carousel(&dashboard_config, report.sensor_ready);
    info!("carousel ready: {} panels", carousel.len());

    run_dashboard(carousel, http, sensor, scene, surface, led, delay)
}

/// The rotation is data-driven: a panel joins only when its config
/// identifiers (and token, where one is needed) are present.
fn build_carousel(
    config: &tally_core::config::DashboardConfig,
    sensor_ready: bool,
) -> Carousel {
    let dwell = config.dwell_s;
    let mut carousel = Carousel::new();

    let panels = [
        github_panel(
            config.github_repo.as_str(),
            config.secrets.github_token.as_str(),
            PanelBackground::Asset(GITHUB_BG),
            dwell,
        ),
        reddit_panel(
            config.subreddit.as_str(),
            PanelBackground::Asset(REDDIT_BG),
            dwell,
        ),
        twitter_panel(
            config.twitter_user.as_str(),
            PanelBackground::Asset(TWITTER_BG),
            dwell,
        ),
        youtube_panel(
            config.youtube_channel.as_str(),
            config.secrets.youtube_token.as_str(),
            PanelBackground::Asset(YOUTUBE_BG),
            dwell,
        ),
    ];
    for panel in panels {
        match panel {
            Ok(spec) => {
                let name = spec.name;
                if carousel.push(PanelEntry::Metric(spec)).is_err() {
                    warn!("carousel full, dropping {name}");
                }
            }
            Err(e) => info!("panel left out of rotation: {e:?}"),
        }
    }

    if sensor_ready {
        let spec = SensorPanelSpec::new(PanelBackground::Asset(AMBIENT_BG), dwell);
        if carousel.push(PanelEntry::Sensor(spec)).is_err() {
            warn!("carousel full, dropping ambient panel");
        }
    }

    carousel
}

fn run_dashboard<S, F, L, D>(
    mut carousel: Carousel,
    mut http: TcpHttpClient,
    mut sensor: S,
    mut scene: Scene,
    mut surface: F,
    mut led: L,
    mut delay: D,
) -> !
where
    S: tally_core::traits::board::AmbientSensor,
    F: tally_core::traits::frame::Frame,
    L: tally_core::traits::led::StatusLed,
    D: embedded_hal::delay::DelayNs,
{
    loop {
        match carousel.run_cycle(
            &mut http,
            &mut sensor,
            &mut scene,
            &mut surface,
            &mut led,
            &mut delay,
        ) {
            Some(CycleOutcome::Shown { panel, .. }) => {
                let _ = CYCLE_LOG.try_send(CycleSummary { panel, shown: true });
            }
            Some(CycleOutcome::Skipped { panel, error }) => {
                warn!("panel {panel} skipped: {error:?}");
                let _ = CYCLE_LOG.try_send(CycleSummary {
                    panel,
                    shown: false,
                });
            }
            None => {
                // Nothing configured; leave the boot screen up
                delay.delay_ms(60_000);
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

#[embassy_executor::task]
async fn log_task() {
    loop {
        let summary = CYCLE_LOG.receive().await;
        if summary.shown {
            info!("cycle: {} shown", summary.panel);
        } else {
            info!("cycle: {} skipped", summary.panel);
        }
    }
}
