// Drop zone behaviour driven through an in-process region.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use upload_engine::{
    DragEvent, DragHandlers, DragTarget, DragZone, DropEffect, DropRegion, FileDescriptor,
    UploadBatch, UploadParams,
};

#[derive(Default)]
struct Calls {
    log: Mutex<Vec<String>>,
    enters: AtomicUsize,
    leaves: AtomicUsize,
}

fn handlers(calls: &Arc<Calls>) -> DragHandlers {
    let on_enter = Arc::clone(calls);
    let on_leave = Arc::clone(calls);
    let on_drop = Arc::clone(calls);
    DragHandlers::new()
        .on_drag_enter(move |_| {
            on_enter.enters.fetch_add(1, Ordering::SeqCst);
            on_enter.log.lock().push("enter".to_string());
        })
        .on_drag_leave(move |_| {
            on_leave.leaves.fetch_add(1, Ordering::SeqCst);
            on_leave.log.lock().push("leave".to_string());
        })
        .on_drop(move |files| {
            let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
            on_drop.log.lock().push(format!("drop:{}", names.join(",")));
        })
}

fn bound() -> (Arc<DropRegion>, DragZone, Arc<Calls>) {
    let region = Arc::new(DropRegion::new("gallery"));
    let calls = Arc::new(Calls::default());
    let zone = DragZone::bind(region.clone(), handlers(&calls));
    (region, zone, calls)
}

fn file(name: &str) -> FileDescriptor {
    FileDescriptor::guessed(name, vec![7u8; 16])
}

#[test]
fn test_nested_enter_leave_coalesces() {
    let (region, zone, calls) = bound();

    // Region, then a child, then back out of both.
    region.dispatch(&mut DragEvent::enter().from_origin("gallery"));
    region.dispatch(&mut DragEvent::enter().from_origin("gallery > img"));
    assert_eq!(zone.depth(), 2);
    region.dispatch(&mut DragEvent::leave().from_origin("gallery"));
    region.dispatch(&mut DragEvent::leave().from_origin("gallery > img"));

    assert_eq!(calls.enters.load(Ordering::SeqCst), 1);
    assert_eq!(calls.leaves.load(Ordering::SeqCst), 1);
    assert_eq!(*calls.log.lock(), vec!["enter", "leave"]);
    assert_eq!(zone.depth(), 0);
}

#[test]
fn test_drop_delivers_files_then_leave() {
    let (region, zone, calls) = bound();

    region.dispatch(&mut DragEvent::enter());
    region.dispatch(&mut DragEvent::enter().from_origin("child"));
    let mut drop = DragEvent::drop_files([file("a.png"), file("b.jpg")]);
    region.dispatch(&mut drop);

    assert!(drop.is_default_prevented());
    assert_eq!(*calls.log.lock(), vec!["enter", "drop:a.png,b.jpg", "leave"]);
    assert_eq!(zone.depth(), 0);

    // The next drag starts from a clean depth.
    region.dispatch(&mut DragEvent::enter());
    assert_eq!(calls.enters.load(Ordering::SeqCst), 2);
}

#[test]
fn test_drop_without_enter_still_signals_leave() {
    let (region, _zone, calls) = bound();
    region.dispatch(&mut DragEvent::drop_files(Vec::<FileDescriptor>::new()));
    assert_eq!(*calls.log.lock(), vec!["drop:", "leave"]);
}

#[test]
fn test_over_requests_copy() {
    let (region, _zone, calls) = bound();
    let mut over = DragEvent::over();
    region.dispatch(&mut over);
    assert!(over.is_default_prevented());
    assert_eq!(over.drop_effect(), DropEffect::Copy);
    assert!(calls.log.lock().is_empty());
}

#[test]
fn test_enter_prevents_default_but_leave_does_not() {
    let (region, _zone, _calls) = bound();
    let mut enter = DragEvent::enter();
    region.dispatch(&mut enter);
    assert!(enter.is_default_prevented());

    let mut leave = DragEvent::leave();
    region.dispatch(&mut leave);
    assert!(!leave.is_default_prevented());
}

#[test]
fn test_stray_leave_is_ignored() {
    let (region, zone, calls) = bound();
    region.dispatch(&mut DragEvent::leave());
    assert_eq!(calls.leaves.load(Ordering::SeqCst), 0);
    assert_eq!(zone.depth(), 0);

    region.dispatch(&mut DragEvent::enter());
    region.dispatch(&mut DragEvent::leave());
    assert_eq!(*calls.log.lock(), vec!["enter", "leave"]);
}

#[test]
fn test_unbind_detaches_listeners() {
    let (region, zone, calls) = bound();
    assert_eq!(region.listener_count(), 4);
    assert!(zone.is_bound());

    zone.unbind();
    assert_eq!(region.listener_count(), 0);

    region.dispatch(&mut DragEvent::enter());
    let mut drop = DragEvent::drop_files([file("late.png")]);
    region.dispatch(&mut drop);
    assert!(calls.log.lock().is_empty());
    assert!(!drop.is_default_prevented());
}

#[test]
fn test_dropping_zone_detaches() {
    let region = Arc::new(DropRegion::new("panel"));
    {
        let _zone = DragZone::bind(region.clone(), DragHandlers::new());
        assert_eq!(region.listener_count(), 4);
    }
    assert_eq!(region.listener_count(), 0);
}

#[test]
fn test_zones_share_a_region_independently() {
    let region = Arc::new(DropRegion::new("shared"));
    let first = Arc::new(Calls::default());
    let second = Arc::new(Calls::default());
    let zone_a = DragZone::bind(region.clone(), handlers(&first));
    let _zone_b = DragZone::bind(region.clone(), handlers(&second));
    assert_eq!(region.listener_count(), 8);

    region.dispatch(&mut DragEvent::enter());
    zone_a.unbind();
    region.dispatch(&mut DragEvent::leave());

    assert_eq!(*first.log.lock(), vec!["enter"]);
    assert_eq!(*second.log.lock(), vec!["enter", "leave"]);
    assert_eq!(region.listener_count(), 4);
}

#[test]
fn test_handlers_are_optional() {
    let region = Arc::new(DropRegion::new("bare"));
    let zone = DragZone::bind(region.clone(), DragHandlers::new());

    region.dispatch(&mut DragEvent::enter());
    let mut over = DragEvent::over();
    region.dispatch(&mut over);
    region.dispatch(&mut DragEvent::drop_files([file("x.txt")]));

    assert_eq!(over.drop_effect(), DropEffect::Copy);
    assert_eq!(zone.depth(), 0);
}

#[test]
fn test_custom_target_receives_registrations() {
    struct CountingTarget {
        added: AtomicUsize,
        removed: AtomicUsize,
        inner: DropRegion,
    }

    impl DragTarget for CountingTarget {
        fn add_listener(
            &self,
            kind: upload_engine::DragEventKind,
            listener: upload_engine::drag::zone::Listener,
        ) -> upload_engine::drag::zone::ListenerId {
            self.added.fetch_add(1, Ordering::SeqCst);
            self.inner.add_listener(kind, listener)
        }

        fn remove_listener(&self, id: upload_engine::drag::zone::ListenerId) -> bool {
            self.removed.fetch_add(1, Ordering::SeqCst);
            self.inner.remove_listener(id)
        }
    }

    let target = Arc::new(CountingTarget {
        added: AtomicUsize::new(0),
        removed: AtomicUsize::new(0),
        inner: DropRegion::new("wrapped"),
    });
    let zone = DragZone::bind(target.clone(), DragHandlers::new());
    assert_eq!(target.added.load(Ordering::SeqCst), 4);
    drop(zone);
    assert_eq!(target.removed.load(Ordering::SeqCst), 4);
    assert_eq!(target.inner.listener_count(), 0);
}

#[tokio::test]
async fn test_drop_feeds_an_upload_batch() {
    use std::time::Duration;

    use async_trait::async_trait;
    use upload_engine::engine::progress::ProgressSink;
    use upload_engine::{TransportResponse, UploadError, UploadRequest, Uploader};

    struct EchoUploader;

    #[async_trait]
    impl Uploader for EchoUploader {
        async fn upload(
            &self,
            request: &UploadRequest,
            _progress: ProgressSink,
        ) -> Result<TransportResponse, UploadError> {
            Ok(TransportResponse::new(200, request.file.name.clone()))
        }
    }

    let region = Arc::new(DropRegion::new("uploader"));
    let batch = Arc::new(UploadBatch::new(Arc::new(EchoUploader)));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));

    let on_drop_batch = Arc::clone(&batch);
    let _zone = DragZone::bind(
        region.clone(),
        DragHandlers::new().on_drop(move |files| {
            let handle = on_drop_batch.invoke(
                UploadParams::new("http://upload.test/", "file").files(files),
            );
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(handle);
            }
        }),
    );

    region.dispatch(&mut DragEvent::enter());
    region.dispatch(&mut DragEvent::drop_files([file("one.png"), file("two.png")]));

    let handle = rx.await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.error, None);
    let bodies: Vec<String> = handle
        .transports()
        .iter()
        .map(|t| t.response_text().unwrap())
        .collect();
    assert_eq!(bodies, vec!["one.png", "two.png"]);
}
