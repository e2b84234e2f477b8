mod config;
mod logging;

use std::{sync::Arc, time::Duration};

use projection_core::{CollectionKey, ListOp, NoticeSink};
use projection_platform::InMemoryImageProvider;
use projection_runtime::{
    AvatarLoader, DiffQueue, RoomItem, RoomListModel, RoomRole, TimelineItem, TimelineModel,
    TimelineRole, UpdateBus,
    rooms::{avatar_image_id, avatar_url},
};
use tokio::time::sleep;
use tracing::info;

use config::SmokeConfig;

#[tokio::main]
async fn main() {
    logging::init();

    let config = match SmokeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to read smoke configuration: {err}");
            std::process::exit(1);
        }
    };
    info!(?config, "starting projection smoke run");

    let settle = Duration::from_millis(config.settle_ms);
    let bus = UpdateBus::new(config.bus_capacity);

    room_list_stage(&config, &bus, settle).await;
    timeline_stage(&config, &bus, settle).await;
    avatar_stage(settle).await;

    println!("Smoke run complete.");
}

async fn room_list_stage(config: &SmokeConfig, bus: &UpdateBus, settle: Duration) {
    println!("== Room list ==");

    let queue = DiffQueue::new(CollectionKey::rooms(config.account_id.clone()), bus.clone());
    let mut model = RoomListModel::new(bus.clone());
    model.bind(Arc::clone(&queue) as _, printing_sink("rooms"));

    queue.publish_batch(vec![
        ListOp::Reset {
            items: vec![
                room("!general:example.org", Some("General")),
                room("!rust:example.org", Some("Rust")),
            ],
        },
        ListOp::Insert {
            index: 1,
            item: room("!alerts:example.org", None),
        },
    ]);
    sleep(settle).await;
    print_rooms(&model);

    queue.publish(ListOp::Set {
        index: 1,
        item: room("!alerts:example.org", Some("Alerts")),
    });
    queue.publish(ListOp::Remove { index: 0 });
    sleep(settle).await;
    print_rooms(&model);

    model.unbind();
}

async fn timeline_stage(config: &SmokeConfig, bus: &UpdateBus, settle: Duration) {
    println!("== Timeline ==");

    let busy = DiffQueue::new(
        CollectionKey::timeline(config.account_id.clone(), "!room-42:example.org"),
        bus.clone(),
    );
    let quiet = DiffQueue::new(
        CollectionKey::timeline(config.account_id.clone(), "!room-7:example.org"),
        bus.clone(),
    );

    let mut model = TimelineModel::new(bus.clone());
    model.set_fetch_batch(config.fetch_batch);
    let pagination_source = Arc::clone(&busy);
    model.set_pagination_hook(Arc::new(move |limit| {
        info!(limit, "pagination requested; prepending scripted history");
        pagination_source.publish(ListOp::PushFront {
            item: event(
                Some("$history-1"),
                "@bot:example.org",
                "from the archive",
                1_000,
            ),
        });
    }));

    model.bind(Arc::clone(&busy) as _, printing_sink("timeline"));
    busy.publish(ListOp::Reset {
        items: vec![
            event(Some("$live-1"), "@alice:example.org", "hello", 2_000),
            event(None, "@demo:example.org", "sending...", 3_000),
        ],
    });
    // Traffic for the unbound room must never reach this projection.
    quiet.publish(ListOp::Reset {
        items: vec![event(Some("$other"), "@bob:example.org", "wrong room", 9_000)],
    });
    sleep(settle).await;
    print_timeline(&model);

    model.fetch_older();
    sleep(settle).await;
    print_timeline(&model);

    println!("-- rebinding to the quiet room --");
    model.bind(Arc::clone(&quiet) as _, printing_sink("timeline"));
    busy.publish(ListOp::PushBack {
        item: event(Some("$stale"), "@alice:example.org", "left behind", 4_000),
    });
    sleep(settle).await;
    print_timeline(&model);

    model.unbind();
}

async fn avatar_stage(settle: Duration) {
    println!("== Avatars ==");

    let provider = InMemoryImageProvider::default();
    if let Err(err) = provider.insert("!general:example.org", vec![0x89, 0x50, 0x4e, 0x47]) {
        eprintln!("Failed to seed avatar store: {err}");
        return;
    }

    let loader = AvatarLoader::new(
        Arc::new(provider),
        Arc::new(|image_id, bytes| {
            println!("  avatar ready: {image_id} ({} bytes)", bytes.len());
        }),
    );

    let url = avatar_url("!general:example.org");
    match avatar_image_id(&url) {
        Some(image_id) => loader.request(image_id),
        None => println!("  unexpected avatar url shape: {url}"),
    }
    // An id nobody stored resolves to nothing; the view keeps its placeholder.
    loader.request("!missing:example.org");
    sleep(settle).await;
}

fn printing_sink(label: &'static str) -> NoticeSink {
    Arc::new(move |notice| println!("  [{label}] notice: {notice:?}"))
}

fn print_rooms(model: &RoomListModel) {
    for row in 0..model.row_count() {
        let id = model.data(row, RoomRole::RoomId).unwrap_or_default();
        let name = model.data(row, RoomRole::DisplayName).unwrap_or_default();
        let avatar = model.data(row, RoomRole::AvatarUrl).unwrap_or_default();
        println!("  row {row}: {name} ({id}) avatar={avatar}");
    }
}

fn print_timeline(model: &TimelineModel) {
    for row in 0..model.row_count() {
        let event_id = model.data(row, TimelineRole::EventId).unwrap_or_default();
        let body = model.data(row, TimelineRole::Body).unwrap_or_default();
        let timestamp = model.data(row, TimelineRole::Timestamp).unwrap_or_default();
        let id = if event_id.is_empty() {
            "<local echo>"
        } else {
            event_id.as_str()
        };
        println!("  row {row}: [{timestamp}] {id}: {body}");
    }
}

fn room(room_id: &str, name: Option<&str>) -> RoomItem {
    RoomItem {
        room_id: room_id.to_owned(),
        name: name.map(str::to_owned),
        unread_notifications: 0,
        highlight_count: 0,
        is_direct: false,
    }
}

fn event(event_id: Option<&str>, sender: &str, body: &str, timestamp_ms: u64) -> TimelineItem {
    TimelineItem {
        event_id: event_id.map(str::to_owned),
        sender: sender.to_owned(),
        body: body.to_owned(),
        timestamp_ms,
    }
}
