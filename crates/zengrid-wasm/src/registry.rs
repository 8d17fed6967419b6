//! Connected elements and their cores, so discovery can go from a found
//! DOM element to the state behind it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use web_sys::Element;
use zengrid::grid::Grid;
use zengrid::toolbar::{Discovery, Toolbar, pair};

use crate::dom::TimeoutScheduler;

type Entries<T> = RefCell<Vec<(Element, Weak<RefCell<T>>)>>;

thread_local! {
    static GRIDS: Entries<Grid> = const { RefCell::new(Vec::new()) };
    static TOOLBARS: Entries<Toolbar> = const { RefCell::new(Vec::new()) };
}

fn insert<T>(entries: &Entries<T>, element: &Element, state: &Rc<RefCell<T>>) {
    let mut entries = entries.borrow_mut();
    entries.retain(|(known, weak)| known != element && weak.strong_count() > 0);
    entries.push((element.clone(), Rc::downgrade(state)));
}

fn remove<T>(entries: &Entries<T>, element: &Element) {
    entries.borrow_mut().retain(|(known, _)| known != element);
}

fn find<T>(entries: &Entries<T>, element: &Element) -> Option<Rc<RefCell<T>>> {
    entries
        .borrow()
        .iter()
        .find(|(known, _)| known == element)
        .and_then(|(_, weak)| weak.upgrade())
}

pub fn register_grid(element: &Element, grid: &Rc<RefCell<Grid>>) {
    GRIDS.with(|entries| insert(entries, element, grid));
}

pub fn unregister_grid(element: &Element) {
    GRIDS.with(|entries| remove(entries, element));
}

pub fn grid_for(element: &Element) -> Option<Rc<RefCell<Grid>>> {
    GRIDS.with(|entries| find(entries, element))
}

pub fn register_toolbar(element: &Element, toolbar: &Rc<RefCell<Toolbar>>) {
    TOOLBARS.with(|entries| insert(entries, element, toolbar));
}

pub fn unregister_toolbar(element: &Element) {
    TOOLBARS.with(|entries| remove(entries, element));
}

pub fn toolbar_for(element: &Element) -> Option<Rc<RefCell<Toolbar>>> {
    TOOLBARS.with(|entries| find(entries, element))
}

/// Pairs two registered cores unless they are already joined.
///
/// When the peer element was found before its core registered, `discovery`
/// is reset so the peer's own connection can complete the pairing.
pub fn link(
    grid: Option<Rc<RefCell<Grid>>>,
    toolbar: Option<Rc<RefCell<Toolbar>>>,
    discovery: &Weak<RefCell<Discovery<Element>>>,
) {
    let (Some(grid), Some(toolbar)) = (grid, toolbar) else {
        debug!("Peer element has no core yet");
        if let Some(discovery) = discovery.upgrade() {
            discovery.borrow_mut().reset();
        }
        return;
    };
    let already = grid.try_borrow().is_ok_and(|grid| grid.has_toolbar())
        && toolbar.try_borrow().is_ok_and(|toolbar| toolbar.is_paired());
    if already {
        return;
    }
    if let Err(err) = pair(&grid, &toolbar, &TimeoutScheduler) {
        warn!(error = %err, "Pairing failed");
    }
}
