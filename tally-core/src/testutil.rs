//! Shared fakes for host tests

use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::scene::Scene;
use crate::status::StatusColor;
use crate::traits::board::{AmbientSensor, AudioError, AudioOut, Backlight, SensorError, TouchInput};
use crate::traits::frame::{Frame, FrameError};
use crate::traits::http::{HttpClient, HttpError, HttpResponse};
use crate::traits::led::StatusLed;
use crate::traits::radio::{RadioError, WifiRadio};
use crate::traits::storage::{FileSink, Storage, StorageError};

/// Minimal valid 1x1 24bpp BMP (58 bytes)
pub const TINY_BMP: &[u8] = &[
    // file header
    0x42, 0x4D, 58, 0, 0, 0, 0, 0, 0, 0, 54, 0, 0, 0,
    // BITMAPINFOHEADER
    40, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 24, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0,
    // one blue pixel + row padding
    0xFF, 0x00, 0x00, 0x00,
];

/// Records every LED fill
pub struct FakeLed {
    pub fills: RefCell<Vec<StatusColor>>,
}

impl FakeLed {
    pub fn new() -> Self {
        Self {
            fills: RefCell::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<StatusColor> {
        self.fills.borrow().last().copied()
    }
}

impl StatusLed for FakeLed {
    fn fill(&mut self, color: StatusColor) {
        self.fills.borrow_mut().push(color);
    }
}

/// Counts presents and snapshots the scene at each one
pub struct CountingFrame {
    pub presents: usize,
    pub last_overlay_texts: Vec<String>,
    pub last_background_count: usize,
}

impl CountingFrame {
    pub fn new() -> Self {
        Self {
            presents: 0,
            last_overlay_texts: Vec::new(),
            last_background_count: 0,
        }
    }
}

impl Frame for CountingFrame {
    fn present(&mut self, scene: &Scene) -> Result<(), FrameError> {
        self.presents += 1;
        self.last_overlay_texts = scene
            .overlays()
            .iter()
            .map(|l| l.text.as_str().to_string())
            .collect();
        self.last_background_count = scene.background_count();
        Ok(())
    }
}

/// Canned HTTP response
pub struct FakeResponse {
    status: u16,
    body: Vec<u8>,
    pos: usize,
    content_length: Option<u64>,
}

impl FakeResponse {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            pos: 0,
            content_length: Some(body.len() as u64),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn without_content_length(mut self) -> Self {
        self.content_length = None;
        self
    }

    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }
}

impl HttpResponse for FakeResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let n = buf.len().min(self.body.len() - self.pos);
        buf[..n].copy_from_slice(&self.body[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// URL-keyed canned responses
pub struct FakeHttp {
    routes: BTreeMap<String, VecDeque<FakeResponse>>,
    pub requests: Vec<String>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
            requests: Vec::new(),
        }
    }

    pub fn route(&mut self, url: &str, response: FakeResponse) {
        self.routes
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }
}

impl HttpClient for FakeHttp {
    type Response = FakeResponse;

    fn get(&mut self, url: &str) -> Result<FakeResponse, HttpError> {
        self.requests.push(url.to_string());
        self.routes
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .ok_or(HttpError::Connect)
    }
}

type SharedFiles = Rc<RefCell<BTreeMap<String, Vec<u8>>>>;

/// In-memory file sink with write-size recording
pub struct MemSink {
    data: Rc<RefCell<Vec<u8>>>,
    writes: Rc<RefCell<Vec<usize>>>,
    fail: bool,
    dest: Option<(SharedFiles, String)>,
}

impl MemSink {
    pub fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new(Vec::new())),
            writes: Rc::new(RefCell::new(Vec::new())),
            fail: false,
            dest: None,
        }
    }

    /// A sink whose every write fails
    pub fn failing() -> Self {
        let mut sink = Self::new();
        sink.fail = true;
        sink
    }

    pub fn data(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.data)
    }

    pub fn writes(&self) -> Rc<RefCell<Vec<usize>>> {
        Rc::clone(&self.writes)
    }
}

impl FileSink for MemSink {
    fn write_all(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::WriteFailed);
        }
        self.data.borrow_mut().extend_from_slice(data);
        self.writes.borrow_mut().push(data.len());
        Ok(())
    }

    fn close(self) -> Result<(), StorageError> {
        if let Some((files, path)) = self.dest {
            files.borrow_mut().insert(path, self.data.borrow().clone());
        }
        Ok(())
    }
}

/// In-memory storage
pub struct MemStorage {
    files: SharedFiles,
    available: bool,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            files: Rc::new(RefCell::new(BTreeMap::new())),
            available: true,
        }
    }

    /// Storage with no card inserted
    pub fn unavailable() -> Self {
        let mut storage = Self::new();
        storage.available = false;
        storage
    }

    pub fn with_file(self, path: &str, bytes: &[u8]) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), bytes.to_vec());
        self
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }
}

impl Storage for MemStorage {
    type Sink = MemSink;

    fn probe(&mut self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::NotAvailable)
        }
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        if !self.available {
            return Err(StorageError::NotAvailable);
        }
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn create(&mut self, path: &str) -> Result<MemSink, StorageError> {
        if !self.available {
            return Err(StorageError::NotAvailable);
        }
        let mut sink = MemSink::new();
        sink.dest = Some((Rc::clone(&self.files), path.to_string()));
        Ok(sink)
    }
}

/// Radio with scripted probe/join failure counts
pub struct ScriptedRadio {
    probe_failures: u32,
    join_failures: u32,
    pub probes: u32,
    pub resets: u32,
    pub join_attempts: u32,
    connected: bool,
}

impl ScriptedRadio {
    pub fn new() -> Self {
        Self::with_failures(0, 0)
    }

    pub fn with_failures(probe_failures: u32, join_failures: u32) -> Self {
        Self {
            probe_failures,
            join_failures,
            probes: 0,
            resets: 0,
            join_attempts: 0,
            connected: false,
        }
    }
}

impl WifiRadio for ScriptedRadio {
    fn probe(&mut self) -> Result<(), RadioError> {
        self.probes += 1;
        if self.probes <= self.probe_failures {
            Err(RadioError::Unresponsive)
        } else {
            Ok(())
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn join(&mut self, _ssid: &str, _password: &str) -> Result<(), RadioError> {
        self.join_attempts += 1;
        if self.join_attempts <= self.join_failures {
            Err(RadioError::JoinFailed)
        } else {
            self.connected = true;
            Ok(())
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// No-op delay for tests
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Backlight recording the last level set
pub struct FakeBacklight {
    pub level: Option<u8>,
}

impl FakeBacklight {
    pub fn new() -> Self {
        Self { level: None }
    }
}

impl Backlight for FakeBacklight {
    fn set_brightness(&mut self, percent: u8) {
        self.level = Some(percent.min(100));
    }
}

/// Speaker recording enable toggles
pub struct FakeAudio {
    pub enabled: Option<bool>,
    pub played: usize,
}

impl FakeAudio {
    pub fn new() -> Self {
        Self {
            enabled: None,
            played: 0,
        }
    }
}

impl AudioOut for FakeAudio {
    fn set_enabled(&mut self, on: bool) {
        self.enabled = Some(on);
    }

    fn play_wav(&mut self, _data: &[u8]) -> Result<(), AudioError> {
        self.played += 1;
        Ok(())
    }
}

/// Touch controller that always (or never) answers
pub struct FakeTouch {
    pub answers: bool,
    pub probed: bool,
}

impl FakeTouch {
    pub fn present() -> Self {
        Self {
            answers: true,
            probed: false,
        }
    }
}

impl TouchInput for FakeTouch {
    fn probe(&mut self) -> bool {
        self.probed = true;
        self.answers
    }
}

/// Sensor returning fixed readings
pub struct FakeSensor {
    pub temperature_dc: Result<i16, SensorError>,
    pub light: Result<u16, SensorError>,
}

impl FakeSensor {
    pub fn fixed(temperature_dc: i16, light: u16) -> Self {
        Self {
            temperature_dc: Ok(temperature_dc),
            light: Ok(light),
        }
    }

    pub fn broken() -> Self {
        Self {
            temperature_dc: Err(SensorError::Bus),
            light: Err(SensorError::Bus),
        }
    }
}

impl AmbientSensor for FakeSensor {
    fn temperature_dc(&mut self) -> Result<i16, SensorError> {
        self.temperature_dc
    }

    fn light_raw(&mut self) -> Result<u16, SensorError> {
        self.light
    }
}
