//! Designer session tests: selection, drag, resize, cancel, save.
//!
//! Sessions run at 4 px/mm, so the sample badge's QR element
//! (32.5, 15, 20×20 mm) covers preview pixels 130..210 × 60..140.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use qrlayout::{
    LayoutError, QrCache, StickerLayout,
    designer::{DesignerConfig, DesignerSession, Geometry, Gesture, Handle, Point},
    layout::{Color, builtin_schemas},
    qr::{QrCodeEncoder, QrEncoder, QrSymbol},
    units::{Resolution, Unit},
};

fn config() -> DesignerConfig {
    DesignerConfig::new(builtin_schemas(), |_| {})
        .with_layout(StickerLayout::sample_badge())
        .with_resolution(Resolution::per_mm(4.0))
}

async fn session() -> DesignerSession {
    DesignerSession::open(config()).await.unwrap()
}

fn geometry(session: &DesignerSession, id: &str) -> Geometry {
    Geometry::of(session.layout().element(id).unwrap())
}

const QR_CENTER: Point = Point { x: 170.0, y: 100.0 };

#[tokio::test]
async fn click_selects_without_moving() {
    let mut s = session().await;
    let before = geometry(&s, "qr-code");

    s.pointer_down(QR_CENTER);
    assert_eq!(s.selected(), Some("qr-code"));
    assert!(matches!(s.gesture(), Gesture::Selecting { .. }));

    // Jitter below the drag threshold
    s.pointer_move(Point::new(171.0, 101.0));
    assert!(matches!(s.gesture(), Gesture::Selecting { .. }));

    assert!(!s.pointer_up().await.unwrap());
    assert!(s.gesture().is_idle());
    assert_eq!(s.selected(), Some("qr-code"));
    assert_eq!(geometry(&s, "qr-code"), before);
}

#[tokio::test]
async fn click_on_empty_space_clears_selection() {
    let mut s = session().await;
    s.select("title").unwrap();
    s.pointer_down(Point::new(2.0, 2.0));
    assert_eq!(s.selected(), None);
    assert!(s.gesture().is_idle());
}

#[tokio::test]
async fn drag_commits_position_on_release() {
    let mut s = session().await;
    let preview_before = s.preview().clone();

    s.pointer_down(QR_CENTER);
    s.pointer_move(Point::new(190.0, 100.0));
    assert!(matches!(s.gesture(), Gesture::Dragging { .. }));
    // Nothing committed mid-gesture
    assert_eq!(geometry(&s, "qr-code").x, 32.5);

    assert!(s.pointer_up().await.unwrap());
    assert_eq!(
        geometry(&s, "qr-code"),
        Geometry { x: 37.5, y: 15.0, w: 20.0, h: 20.0 }
    );
    assert!(s.gesture().is_idle());
    assert!(!s.is_preview_stale());
    assert_ne!(s.preview(), &preview_before);
}

#[tokio::test]
async fn drag_stays_on_the_label() {
    let mut s = session().await;
    s.pointer_down(QR_CENTER);
    s.pointer_move(Point::new(1000.0, -1000.0));
    s.pointer_up().await.unwrap();
    let g = geometry(&s, "qr-code");
    assert_eq!((g.x, g.y), (65.0, 0.0));
}

#[tokio::test]
async fn resize_from_bottom_right_keeps_origin() {
    let mut s = session().await;
    s.select("qr-code").unwrap();

    s.pointer_down(Point::new(210.0, 140.0));
    assert!(matches!(
        s.gesture(),
        Gesture::Resizing { handle: Handle::BottomRight, .. }
    ));
    s.pointer_move(Point::new(230.0, 150.0));
    assert!(s.pointer_up().await.unwrap());

    assert_eq!(
        geometry(&s, "qr-code"),
        Geometry { x: 32.5, y: 15.0, w: 25.0, h: 22.5 }
    );
}

#[tokio::test]
async fn resize_from_top_left_moves_origin() {
    let mut s = session().await;
    s.select("qr-code").unwrap();

    s.pointer_down(Point::new(130.0, 60.0));
    s.pointer_move(Point::new(122.0, 52.0));
    s.pointer_up().await.unwrap();

    assert_eq!(
        geometry(&s, "qr-code"),
        Geometry { x: 30.5, y: 13.0, w: 22.0, h: 22.0 }
    );
}

#[tokio::test]
async fn cancel_discards_partial_geometry() {
    let mut s = session().await;
    let before = geometry(&s, "qr-code");
    let preview_before = s.preview().clone();

    s.pointer_down(QR_CENTER);
    s.pointer_move(Point::new(230.0, 130.0));
    assert!(s.gesture().pending().is_some());
    s.cancel();

    assert!(s.gesture().is_idle());
    assert!(!s.pointer_up().await.unwrap());
    assert_eq!(geometry(&s, "qr-code"), before);
    assert_eq!(s.preview(), &preview_before);
}

#[tokio::test]
async fn overlay_shows_selection() {
    let mut s = session().await;
    assert_eq!(&s.render_overlay(), s.preview());

    s.select("title").unwrap();
    let overlay = s.render_overlay();
    assert_ne!(&overlay, s.preview());
    // Handle outline at the title's top-left corner (20, 20)
    assert_eq!(overlay.pixel(16, 16), Some(Color::rgb(0x25, 0x63, 0xeb)));
}

#[tokio::test]
async fn unknown_element_is_rejected() {
    let mut s = session().await;
    assert!(matches!(s.select("nope"), Err(LayoutError::UnknownElement(_))));
    assert!(matches!(
        s.update_content("nope", "x").await,
        Err(LayoutError::UnknownElement(_))
    ));
    assert!(matches!(
        s.remove_element("nope").await,
        Err(LayoutError::UnknownElement(_))
    ));
}

#[tokio::test]
async fn remove_clears_selection() {
    let mut s = session().await;
    s.select("dept-label").unwrap();
    let removed = s.remove_element("dept-label").await.unwrap();
    assert_eq!(removed.id, "dept-label");
    assert_eq!(s.selected(), None);
    assert_eq!(s.layout().elements.len(), 3);
}

#[tokio::test]
async fn z_order_moves() {
    let mut s = session().await;
    assert!(!s.send_backward("title").await.unwrap());
    assert!(!s.bring_forward("dept-label").await.unwrap());

    assert!(s.bring_forward("title").await.unwrap());
    let order: Vec<&str> = s.layout().elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(order, vec!["qr-code", "title", "name-label", "dept-label"]);
}

#[tokio::test]
async fn unit_change_converts_geometry() {
    let mut s = session().await;
    s.set_unit(Unit::Inch).await.unwrap();

    let layout = s.layout();
    assert_eq!(layout.unit, Unit::Inch);
    assert!((layout.width - 85.0 / 25.4).abs() < 1e-9);
    let qr = layout.element("qr-code").unwrap();
    assert!((qr.x - 32.5 / 25.4).abs() < 1e-9);
    assert!((qr.w - 20.0 / 25.4).abs() < 1e-9);
    // Same label size on screen
    assert_eq!((s.preview().width(), s.preview().height()), (340, 216));
}

#[tokio::test]
async fn unit_change_rewrites_declared_element_units() {
    let saved: Arc<Mutex<Vec<StickerLayout>>> = Arc::default();
    let sink = saved.clone();
    let mut badge = StickerLayout::sample_badge();
    badge.elements[0]
        .extra
        .insert("unit".to_string(), serde_json::json!("mm"));
    let config = DesignerConfig::new(builtin_schemas(), move |layout| {
        sink.lock().unwrap().push(layout);
    })
    .with_layout(badge)
    .with_resolution(Resolution::per_mm(4.0));

    let mut s = DesignerSession::open(config).await.unwrap();
    s.set_unit(Unit::Inch).await.unwrap();
    assert_eq!(s.layout().unit, Unit::Inch);
    assert_eq!(s.layout().elements[0].extra["unit"], "in");
    assert!(!s.is_preview_stale());

    // Later edits and save still work.
    s.update_content("title", "VISITOR").await.unwrap();
    s.save().unwrap();
    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].elements[0].extra["unit"], "in");
}

#[tokio::test]
async fn retargeting_switches_schema() {
    let mut s = session().await;
    assert!(matches!(
        s.set_target_entity("spaceship").await,
        Err(LayoutError::UnknownEntity(_))
    ));

    s.set_target_entity("machine").await.unwrap();
    assert_eq!(s.layout().target_entity, "machine");
    assert_eq!(s.sample_record()["machineId"], "MAC-05");
    let tokens: Vec<String> = s.field_tokens().into_iter().map(|(_, t)| t).collect();
    assert_eq!(tokens[0], "{{machineName}}");
}

#[tokio::test]
async fn rejected_layout_edits_change_nothing() {
    let mut s = session().await;
    let before = s.layout().clone();
    assert!(s.set_size(0.0, 10.0).await.is_err());
    assert!(s.set_background("#zzz").await.is_err());
    assert!(s
        .set_geometry("title", Geometry { x: 0.0, y: 0.0, w: -1.0, h: 5.0 })
        .await
        .is_err());
    assert_eq!(s.layout(), &before);
}

#[tokio::test]
async fn add_qr_uses_first_field() {
    let mut s = session().await;
    let id = s.add_qr().await.unwrap();
    let element = s.layout().element(&id).unwrap();
    assert_eq!(element.content, "{{fullName}}");
    assert_eq!(element.w, element.h);
    assert_eq!(s.selected(), Some(id.as_str()));
}

#[tokio::test]
async fn save_hands_working_layout_to_callback() {
    let saved: Arc<Mutex<Vec<StickerLayout>>> = Arc::default();
    let sink = saved.clone();
    let config = DesignerConfig::new(builtin_schemas(), move |layout| {
        sink.lock().unwrap().push(layout);
    })
    .with_layout(StickerLayout::sample_badge())
    .with_resolution(Resolution::per_mm(4.0));

    let mut s = DesignerSession::open(config).await.unwrap();
    s.pointer_down(QR_CENTER);
    s.pointer_move(Point::new(190.0, 100.0));
    s.pointer_up().await.unwrap();
    let expected = s.layout().clone();
    s.save().unwrap();

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0], expected);
    assert_eq!(saved[0].element("qr-code").unwrap().x, 37.5);
}

#[tokio::test]
async fn destroy_discards_changes() {
    let saved: Arc<Mutex<Vec<StickerLayout>>> = Arc::default();
    let sink = saved.clone();
    let config = DesignerConfig::new(builtin_schemas(), move |layout| {
        sink.lock().unwrap().push(layout);
    })
    .with_resolution(Resolution::per_mm(4.0));

    let mut s = DesignerSession::open(config).await.unwrap();
    s.add_text().await.unwrap();
    s.destroy();
    assert!(saved.lock().unwrap().is_empty());
}

struct SlowEncoder;

impl QrEncoder for SlowEncoder {
    fn encode(&self, text: &str) -> Result<QrSymbol, LayoutError> {
        std::thread::sleep(Duration::from_millis(300));
        QrCodeEncoder::default().encode(text)
    }
}

#[tokio::test]
async fn dropped_refresh_leaves_preview_untouched() {
    let config = DesignerConfig::new(builtin_schemas(), |_| {})
        .with_resolution(Resolution::per_mm(4.0))
        .with_cache(Arc::new(QrCache::with_encoder(Arc::new(SlowEncoder))));
    let mut s = DesignerSession::open(config).await.unwrap();
    let preview_before = s.preview().clone();

    let result = tokio::time::timeout(Duration::from_millis(20), s.add_qr()).await;
    assert!(result.is_err(), "refresh should still be waiting on the encoder");

    assert!(s.is_preview_stale());
    assert_eq!(s.preview(), &preview_before);
}
