use iced::widget::{button, canvas, column, container, horizontal_space, mouse_area, row, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod device;
mod error;
mod media;
mod state;
mod ui;

use config::Config;
use device::camera::TetherCamera;
use device::gallery::DirectoryGallery;
use device::kv::SqliteKv;
use device::location::FixedLocation;
use device::{Camera, LocationSource};
use error::{blocking, Error};
use state::capture::CaptureWorkflow;
use state::data::{CaptureEntry, LocationState, PermissionState, Selection};
use state::gate::{self, CameraPanel, Readiness};
use state::store::{EntryStore, HydrationReport};

/// How long a failure notice stays on screen
const NOTICE_DURATION: Duration = Duration::from_secs(4);

/// Which screen is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    /// Permission gate, shutter, entry table and map
    Camera,
    /// Read-only entry table and map
    Entries,
}

/// Device capabilities and the capture core, built once at startup
struct Services {
    camera: Arc<dyn Camera>,
    location: Arc<dyn LocationSource>,
    workflow: Arc<CaptureWorkflow>,
    thumbnail_dir: Option<PathBuf>,
}

impl Services {
    fn from_config(config: &Config) -> Result<Self, Error> {
        let kv = Arc::new(SqliteKv::open(config.database_path())?);
        let camera: Arc<dyn Camera> = Arc::new(TetherCamera::new(
            config.inbox_dir(),
            config.capture_dir(),
            kv.clone(),
        ));
        let location = Arc::new(FixedLocation::new(config.location.enabled, config.position()));
        let gallery = Arc::new(DirectoryGallery::new(config.gallery_dir()));
        let store = Arc::new(EntryStore::new(kv.clone()));

        tracing::info!(
            database = %kv.path().display(),
            inbox = %config.inbox_dir().display(),
            gallery = %config.gallery_dir().display(),
            album = config.album_name(),
            "devices ready"
        );

        Ok(Self {
            camera: camera.clone(),
            location,
            workflow: Arc::new(CaptureWorkflow::new(camera, gallery, store, config.album_name())),
            thumbnail_dir: media::thumbnail::default_cache_dir(),
        })
    }
}

#[derive(Debug, Clone)]
struct Notice {
    id: u64,
    text: String,
}

/// Main application state
struct GeoCam {
    services: Services,
    screen: Screen,
    permission: PermissionState,
    location: LocationState,
    /// Set once the location snapshot has been taken
    located: bool,
    /// Set once the persisted list has been loaded
    hydrated: bool,
    /// Rendered copy of the entry store
    entries: Vec<CaptureEntry>,
    /// Thumbnail paths keyed by entry uri
    thumbnails: HashMap<String, PathBuf>,
    selection: Selection,
    capturing: bool,
    notice: Option<Notice>,
    next_notice_id: u64,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    PermissionAnswered(PermissionState),
    LocationResolved(LocationState),
    Hydrated(Result<(HydrationReport, Vec<CaptureEntry>), Error>),
    /// User pressed the shutter
    Capture,
    CaptureFinished(Result<CaptureEntry, Error>),
    ThumbnailsReady(Vec<(String, PathBuf)>),
    ShowOnMap(CaptureEntry),
    /// Close button, or a press outside the map
    ClearSelection,
    Navigate(Screen),
    DismissNotice(u64),
}

impl GeoCam {
    /// Create the application and start the startup requests.
    /// Camera permission, location snapshot and hydration run concurrently.
    fn new(services: Services) -> (Self, Task<Message>) {
        let camera = services.camera.clone();
        let permission = Task::perform(
            blocking(move || Ok(gate::request_camera_access(camera.as_ref()))),
            |result| Message::PermissionAnswered(result.unwrap_or(PermissionState::Denied)),
        );

        let source = services.location.clone();
        let location = Task::perform(
            blocking(move || Ok(gate::locate(source.as_ref()))),
            |result| Message::LocationResolved(result.unwrap_or_default()),
        );

        let store = services.workflow.store().clone();
        let hydrate = Task::perform(
            blocking(move || {
                let report = store.hydrate()?;
                Ok((report, store.snapshot()))
            }),
            Message::Hydrated,
        );

        let app = GeoCam {
            services,
            screen: Screen::Camera,
            permission: PermissionState::Pending,
            location: LocationState::Unknown,
            located: false,
            hydrated: false,
            entries: Vec::new(),
            thumbnails: HashMap::new(),
            selection: Selection::default(),
            capturing: false,
            notice: None,
            next_notice_id: 0,
        };

        (app, Task::batch([permission, location, hydrate]))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PermissionAnswered(permission) => {
                self.permission = permission;
                Task::none()
            }
            Message::LocationResolved(location) => {
                self.location = location;
                self.located = true;
                Task::none()
            }
            Message::Hydrated(Ok((report, entries))) => {
                self.hydrated = true;
                self.entries = entries;
                let uris = self.entries.iter().map(|e| e.uri.clone()).collect();
                let thumbnails = self.generate_thumbnails(uris);

                if !report.lost_data() {
                    return thumbnails;
                }
                let warning = if report.malformed {
                    "Saved photo list was unreadable and has been reset.".to_string()
                } else {
                    format!("{} saved photo entries could not be read and were discarded.", report.dropped)
                };
                Task::batch([thumbnails, self.notify(warning)])
            }
            Message::Hydrated(Err(e)) => {
                // Capture stays disabled so nothing overwrites the unread list
                tracing::error!(error = %e, "entry list unavailable");
                self.notify(format!("Saved photos could not be loaded: {}", e))
            }
            Message::Capture => {
                if !self.can_capture() {
                    return Task::none();
                }
                self.capturing = true;

                let workflow = self.services.workflow.clone();
                let (permission, location) = (self.permission, self.location);
                Task::perform(
                    blocking(move || workflow.capture(permission, location)),
                    Message::CaptureFinished,
                )
            }
            Message::CaptureFinished(result) => {
                self.capturing = false;
                // The store may hold the entry even when persisting it failed
                self.entries = self.services.workflow.store().snapshot();

                match result {
                    Ok(entry) => {
                        tracing::info!(
                            uri = %entry.uri,
                            count = self.services.workflow.store().len(),
                            "capture recorded"
                        );
                        self.generate_thumbnails(vec![entry.uri])
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "capture failed");
                        self.notify(format!("Capture failed: {}", e))
                    }
                }
            }
            Message::ThumbnailsReady(ready) => {
                self.thumbnails.extend(ready);
                Task::none()
            }
            Message::ShowOnMap(entry) => {
                let located = entry.coordinates().is_some();
                self.selection.select(entry);
                if located {
                    Task::none()
                } else {
                    self.notify("No location was recorded for this photo.".to_string())
                }
            }
            Message::ClearSelection => {
                self.selection.clear();
                Task::none()
            }
            Message::Navigate(screen) => {
                self.screen = screen;
                Task::none()
            }
            Message::DismissNotice(id) => {
                if self.notice.as_ref().is_some_and(|n| n.id == id) {
                    self.notice = None;
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = row![
            text("GeoCam").size(28),
            horizontal_space(),
            self.nav_button("Camera", Screen::Camera),
            self.nav_button("Entries", Screen::Entries),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let body = match self.screen {
            Screen::Camera => self.camera_view(),
            Screen::Entries => self.entries_view(),
        };

        let mut content: Column<Message> = column![header].spacing(16).padding(20);
        if let Some(notice) = &self.notice {
            content = content.push(ui::notice(&notice.text));
        }
        content = content.push(body);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn can_capture(&self) -> bool {
        Readiness {
            permission: self.permission,
            location_settled: self.located,
            hydrated: self.hydrated,
            capturing: self.capturing,
        }
        .can_capture()
    }

    fn camera_view(&self) -> Element<Message> {
        match gate::camera_panel(self.permission) {
            CameraPanel::Message(status) => text(status).into(),
            CameraPanel::CaptureControls => {
                let label = if self.capturing { "Capturing..." } else { "Take Photo" };
                let shutter = button(text(label).size(18))
                    .padding(10)
                    .on_press_maybe(self.can_capture().then_some(Message::Capture));

                let position = match self.location {
                    LocationState::Known(c) => format!("Location: {:.5}, {:.5}", c.latitude, c.longitude),
                    LocationState::Unknown => "Location unknown".to_string(),
                };

                column![
                    row![shutter, text(position).size(14)]
                        .spacing(20)
                        .align_y(Alignment::Center),
                    self.entries_view(),
                ]
                .spacing(16)
                .into()
            }
        }
    }

    fn entries_view(&self) -> Element<Message> {
        let table = mouse_area(ui::table::entry_table(&self.entries, &self.thumbnails))
            .on_press(Message::ClearSelection);

        let mut content = column![table].spacing(12);

        if let (Some(entry), Some(region)) = (self.selection.entry(), self.selection.region()) {
            let map = ui::map::MapView {
                region,
                markers: self.selection.markers(),
            };
            content = content.push(
                row![
                    text(format!("Image Location, {}", entry.formatted_time())).size(16),
                    horizontal_space(),
                    button(text("Close map").size(14)).on_press(Message::ClearSelection),
                ]
                .align_y(Alignment::Center),
            );
            content = content.push(canvas(map).width(Length::Fill).height(Length::Fill));
        }

        content.height(Length::Fill).into()
    }

    fn nav_button(&self, label: &'static str, screen: Screen) -> Element<'static, Message> {
        button(text(label))
            .on_press_maybe((self.screen != screen).then_some(Message::Navigate(screen)))
            .into()
    }

    /// Show a transient notice; it clears itself after NOTICE_DURATION
    fn notify(&mut self, text: String) -> Task<Message> {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        self.notice = Some(Notice { id, text });

        Task::perform(tokio::time::sleep(NOTICE_DURATION), move |_| Message::DismissNotice(id))
    }

    fn generate_thumbnails(&self, uris: Vec<String>) -> Task<Message> {
        let Some(cache_dir) = self.services.thumbnail_dir.clone() else {
            return Task::none();
        };
        if uris.is_empty() {
            return Task::none();
        }

        Task::perform(
            blocking(move || Ok(media::thumbnail::generate_all(&cache_dir, &uris))),
            |result| Message::ThumbnailsReady(result.unwrap_or_default()),
        )
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geocam=info")),
        )
        .init();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::error!(error = %e, "using default configuration");
        Config::default()
    });

    let services = match Services::from_config(&config) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize storage");
            std::process::exit(1);
        }
    };

    iced::application("GeoCam", GeoCam::update, GeoCam::view)
        .theme(GeoCam::theme)
        .centered()
        .run_with(move || GeoCam::new(services))
}
