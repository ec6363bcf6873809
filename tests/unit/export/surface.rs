use super::*;
use crate::card::{CardData, FontBook, build_card_tree};

#[test]
fn guards_detach_on_drop() {
    let doc = HostDocument::new();
    {
        let _c = doc.create_detached_container();
        let _s = doc.create_isolated_surface(1400, 700).unwrap();
        assert_eq!(
            doc.attached(),
            vec![AttachedKind::DetachedContainer, AttachedKind::IsolatedSurface]
        );
    }
    assert_eq!(doc.attached_count(), 0);
}

#[test]
fn markup_moves_into_isolated_surface() {
    let doc = HostDocument::new();
    let tree = build_card_tree(&CardData::new("Alex", "hi"), &FontBook::empty());

    let mut container = doc.create_detached_container();
    assert!(container.markup().is_err());
    container.render(tree.clone());
    let markup = container.markup().unwrap();
    drop(container);
    assert_eq!(doc.attached_count(), 0);

    let mut surface = doc.create_isolated_surface(1400, 700).unwrap();
    assert!(surface.root().is_err());
    surface.write(&markup).unwrap();
    assert_eq!(surface.root().unwrap(), &tree);
    assert_eq!(surface.size(), (1400, 700));
}

#[test]
fn inaccessible_document_refuses_surfaces() {
    let doc = HostDocument::without_isolated_surfaces();
    let err = doc.create_isolated_surface(1400, 700).unwrap_err();
    assert!(matches!(err, CardError::ExportSurfaceUnavailable(_)));
    assert_eq!(doc.attached_count(), 0);
}

#[test]
fn ids_are_unique() {
    let doc = HostDocument::new();
    let a = doc.create_detached_container();
    let b = doc.create_detached_container();
    assert_ne!(a.id(), b.id());
}
