/// End-to-end tests for the front-end controller and command execution.
///
/// A real `VolumeList` runs over the in-memory backend so selection,
/// refills and eject reporting go through the same paths as on hardware.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use usbeject_cli::{execute, AppState, Command};
use usbeject_core::eject::Veto;
use usbeject_core::events::HardwareEvent;
use usbeject_core::platform::memory::MemoryBackend;
use usbeject_core::{
    DeviceKey, DiskEntry, DriveEntry, EjectError, VetoType, VolumeEntry, VolumeList,
    VolumeListConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Three sticks mounted at E:, F: and G:, each on its own disk.
fn three_sticks() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    for (n, letter, label) in [(1u32, 'E', "ALPHA"), (2, 'F', "BRAVO"), (3, 'G', "CHARLIE")] {
        let volume_id = format!("V{n}");
        let device_path = format!("\\Device\\HarddiskVolume{n}");
        backend.add_disk(DiskEntry {
            container: DeviceKey::DevInst(n * 10),
            disk_id: format!("USBSTOR\\DISK\\{n}"),
            friendly_name: format!("Stick {n}"),
            volume_ids: vec![volume_id.clone()],
        });
        backend.add_volume(VolumeEntry::new(volume_id, device_path.clone()));
        backend.add_drive(DriveEntry::lettered(letter, device_path, label, "FAT32"));
    }
    backend
}

fn app(backend: &Arc<MemoryBackend>) -> AppState {
    AppState::new(VolumeList::with_backend(
        backend.clone(),
        VolumeListConfig::default(),
    ))
}

fn pump_until(state: &mut AppState, mut done: impl FnMut(&AppState) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(state) {
        assert!(Instant::now() < deadline, "timed out pumping events");
        state.pump(Duration::from_millis(20));
    }
}

fn run(command: Command, state: &mut AppState) -> (anyhow::Result<()>, String) {
    let mut out = Vec::new();
    let result = execute(&command, state, &mut out, || true);
    (result, String::from_utf8(out).unwrap())
}

// ── Selection ────────────────────────────────────────────────────────────────

/// The first row is selected on start-up.
#[test]
fn first_row_selected_initially() {
    let backend = three_sticks();
    let state = app(&backend);
    assert_eq!(state.selected_index(), Some(0));
    assert_eq!(state.info_lines()[0], ("Display name", "ALPHA (E:)".to_owned()));
}

/// Nothing is selected when the list is empty.
#[test]
fn empty_list_has_no_selection() {
    let backend = Arc::new(MemoryBackend::new());
    let mut state = app(&backend);
    assert_eq!(state.selected_index(), None);
    assert!(state.info_lines().is_empty());
    assert!(!state.request_eject());
    assert!(backend.eject_calls().is_empty());
}

/// The selection follows its mount root when rows above it disappear.
#[test]
fn selection_survives_refill() {
    let backend = three_sticks();
    let mut state = app(&backend);
    state.select(2);

    backend.unplug(&DeviceKey::DevInst(10));
    backend.emit(HardwareEvent::InterfaceRemoval);
    pump_until(&mut state, |s| s.volumes().len() == 2);

    assert_eq!(state.selected_index(), Some(1));
    assert_eq!(
        state.selected_volume().map(|v| v.root_directory.clone()),
        Some(PathBuf::from("G:\\"))
    );
}

/// When the selected volume goes away the selection falls back to the top.
#[test]
fn selection_resets_when_volume_vanishes() {
    let backend = three_sticks();
    let mut state = app(&backend);
    state.select(1);

    backend.unplug(&DeviceKey::DevInst(20));
    state.refresh();

    assert_eq!(state.selected_index(), Some(0));
    assert_eq!(state.volumes().len(), 2);
}

/// Selecting past the end clears the selection.
#[test]
fn select_out_of_range_clears() {
    let backend = three_sticks();
    let mut state = app(&backend);
    state.select(7);
    assert_eq!(state.selected_index(), None);
}

// ── Ejecting ─────────────────────────────────────────────────────────────────

/// Clicking eject again while one is running does nothing.
#[test]
fn eject_clicks_ignored_while_ejecting() {
    let backend = three_sticks();
    let (release, gate) = crossbeam_channel::unbounded();
    backend.set_eject_gate(gate);
    let mut state = app(&backend);

    assert!(state.request_eject());
    assert!(state.is_ejecting());
    state.select(1);
    assert!(!state.request_eject());
    assert!(!state.request_eject_at(2));

    release.send(()).unwrap();
    pump_until(&mut state, |s| s.last_report().is_some());
    assert_eq!(backend.eject_calls(), vec![DeviceKey::DevInst(10)]);
    assert_eq!(state.last_error(), None);
}

/// A refused eject is kept as the last error with the veto text.
#[test]
fn refusal_becomes_last_error() {
    let backend = three_sticks();
    backend.script_eject(Err(Veto::new(
        VetoType::WindowsApp,
        Some("explorer.exe".into()),
    )));
    let mut state = app(&backend);

    state.request_eject();
    pump_until(&mut state, |s| s.last_report().is_some());

    assert_eq!(
        state.last_error().as_deref(),
        Some(
            "Could not eject ALPHA (E:): A Microsoft Win32 application vetoed the \
             specified operation. \"explorer.exe\""
        )
    );
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// `list` prints each row with its details.
#[test]
fn list_prints_rows_and_details() {
    let backend = three_sticks();
    let mut state = app(&backend);
    let (result, out) = run(Command::List { json: false }, &mut state);
    result.unwrap();

    assert!(out.starts_with("[0] ALPHA (E:)\n"));
    assert!(out.contains("[2] CHARLIE (G:)\n"));
    assert!(out.contains("Device instance  30"));
}

/// `list --json` emits an array with one object per volume.
#[test]
fn list_json_is_parseable() {
    let backend = three_sticks();
    let mut state = app(&backend);
    let (result, out) = run(Command::List { json: true }, &mut state);
    result.unwrap();

    let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["friendly_display_name"], "BRAVO (F:)");
}

/// `eject` waits for the outcome and reports success.
#[test]
fn eject_command_reports_success() {
    let backend = three_sticks();
    let mut state = app(&backend);
    let (result, out) = run(Command::Eject { index: 1 }, &mut state);
    result.unwrap();

    assert_eq!(out, "BRAVO (F:) ejected. The device can be safely removed.\n");
    assert_eq!(backend.eject_calls(), vec![DeviceKey::DevInst(20)]);
}

/// `eject` with a bad index fails without touching hardware.
#[test]
fn eject_command_rejects_bad_index() {
    let backend = three_sticks();
    let mut state = app(&backend);
    let (result, out) = run(Command::Eject { index: 3 }, &mut state);

    let err = result.unwrap_err();
    assert!(out.is_empty());
    assert_eq!(
        err.downcast_ref::<EjectError>(),
        Some(&EjectError::InvalidIndex { index: 3, len: 3 })
    );
    assert!(backend.eject_calls().is_empty());
}

/// `eject` surfaces refusals as an error carrying the veto text.
#[test]
fn eject_command_surfaces_refusal() {
    let backend = three_sticks();
    backend.script_eject(Err(Veto::new(VetoType::OutstandingOpen, None)));
    let mut state = app(&backend);
    let (result, _) = run(Command::Eject { index: 0 }, &mut state);

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Could not eject ALPHA (E:)");
    assert_eq!(
        err.root_cause().to_string(),
        "The requested operation was rejected because of outstanding open handles."
    );
}

/// `watch` prints the initial list, then reprints after each change.
#[test]
fn watch_reprints_after_change() {
    let backend = three_sticks();
    let mut state = app(&backend);
    let emitter = Arc::clone(&backend);
    let mut ticks = 0;
    let mut out = Vec::new();

    execute(&Command::Watch, &mut state, &mut out, || {
        ticks += 1;
        if ticks == 1 {
            emitter.unplug(&DeviceKey::DevInst(30));
            emitter.emit(HardwareEvent::InterfaceRemoval);
        }
        ticks > 2
    })
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    let (before, after) = out.split_once("--\n").unwrap();
    assert!(before.contains("CHARLIE (G:)"));
    assert!(!after.contains("CHARLIE"));
    assert!(after.contains("[1] BRAVO (F:)"));
}
