//! Mock construction helpers

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use replaykit_rs::backend::{
    InputInjector, InputListener, MemoryVideoSinkFactory, MockScreenGrabber, MonitorInfo,
    RecordingInjector, ScreenGrabber,
};
use replaykit_rs::{DeviceSet, StopSignal};

/// Simulated devices whose injector and videos stay inspectable
pub struct TestDevices {
    pub devices: DeviceSet,
    pub injector: RecordingInjector,
    pub sinks: MemoryVideoSinkFactory,
}

/// Devices with the given monitors and no input
pub fn test_devices(monitors: Vec<MonitorInfo>) -> TestDevices {
    let injector = RecordingInjector::new(1920, 1080);
    let sinks = MemoryVideoSinkFactory::new().touching_files();
    let devices = DeviceSet::new(
        move || Box::new(MockScreenGrabber::new(monitors.clone())) as Box<dyn ScreenGrabber>,
        Vec::<Box<dyn InputListener>>::new,
        Box::new(injector.clone()) as Box<dyn InputInjector>,
        Arc::new(sinks.clone()),
    );
    TestDevices {
        devices,
        injector,
        sinks,
    }
}

pub fn single_monitor() -> Vec<MonitorInfo> {
    vec![MonitorInfo::new(0, 0, 1920, 1080)]
}

/// Keep triggering `stop` every `period` until `done` is set
///
/// Used when the code under test resets the signal before it starts
/// waiting on it.
pub fn keep_stopping(stop: &StopSignal, done: &StopSignal, period: Duration) -> JoinHandle<()> {
    let stop = stop.clone();
    let done = done.clone();
    std::thread::spawn(move || {
        while !done.is_set() {
            std::thread::sleep(period);
            stop.trigger();
        }
    })
}
