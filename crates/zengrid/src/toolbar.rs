//! Toolbar model and the grid/toolbar pairing protocol.
//!
//! A grid and its toolbar are separate elements with no shared parent
//! controller. They find each other through [`Discovery`] over an
//! [`ElementTree`], are joined by [`pair`], and from then on talk only
//! through two capability traits:
//!
//! - [`GridPeer`]: what a toolbar may ask of a grid (search, export, options).
//! - [`ToolbarPeer`]: what a grid pushes to a toolbar ([`ToolbarNotice`]).
//!
//! The toolbar derives its affordances purely from the notices it receives;
//! it never reads grid state directly.

use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GridError, Result};
use crate::export::{ExportEncoder, ExportFormat, ExportSnapshot};
use crate::i18n::{Localizer, TranslationKey};
use crate::model::ToolbarOptions;
use crate::schedule::{ANNOUNCE_DELAY, DISCOVERY_RETRY_DELAY, Scheduler};

/// Tag name of the grid element.
pub const GRID_TAG: &str = "zen-grid";

/// Tag name of the toolbar element.
pub const TOOLBAR_TAG: &str = "zen-grid-toolbar";

// =============================================================================
// Capabilities
// =============================================================================

/// Change pushed from a grid to its paired toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarNotice {
    /// Full toolbar options after a merge or on pairing.
    OptionsChanged(ToolbarOptions),
    /// Language applied by the grid.
    LanguageChanged(String),
}

/// What a toolbar may ask of its grid.
pub trait GridPeer {
    /// Runs a global search with `term`.
    fn deliver_search(&mut self, term: &str);
    /// Raw data and columns for export.
    fn export_snapshot(&self) -> ExportSnapshot;
    /// Current toolbar options, announced on pairing.
    fn toolbar_options(&self) -> ToolbarOptions;
    fn attach_toolbar(&mut self, toolbar: Weak<RefCell<dyn ToolbarPeer>>);
}

/// What a grid pushes to its toolbar.
pub trait ToolbarPeer {
    fn receive(&mut self, notice: &ToolbarNotice);
    fn attach_grid(&mut self, grid: Weak<RefCell<dyn GridPeer>>);
}

/// Joins a grid and a toolbar.
///
/// This is the single pairing signal: both sides get a weak reference to the
/// other, a search typed before pairing is delivered, and the grid's toolbar
/// options are announced to the toolbar after [`ANNOUNCE_DELAY`].
pub fn pair<G, T>(grid: &Rc<RefCell<G>>, toolbar: &Rc<RefCell<T>>, scheduler: &dyn Scheduler) -> Result<()>
where
    G: GridPeer + 'static,
    T: ToolbarPeer + 'static,
{
    let grid_dyn: Rc<RefCell<dyn GridPeer>> = Rc::clone(grid) as Rc<RefCell<dyn GridPeer>>;
    let toolbar_dyn: Rc<RefCell<dyn ToolbarPeer>> = Rc::clone(toolbar) as Rc<RefCell<dyn ToolbarPeer>>;
    let grid_weak = Rc::downgrade(&grid_dyn);
    let toolbar_weak = Rc::downgrade(&toolbar_dyn);

    grid.try_borrow_mut()
        .map_err(|_| GridError::PeerUnavailable("grid is busy".into()))?
        .attach_toolbar(Weak::clone(&toolbar_weak));
    toolbar
        .try_borrow_mut()
        .map_err(|_| GridError::PeerUnavailable("toolbar is busy".into()))?
        .attach_grid(Weak::clone(&grid_weak));
    info!("Grid and toolbar paired");

    scheduler.defer(
        ANNOUNCE_DELAY,
        Box::new(move || announce(&grid_weak, &toolbar_weak)),
    );
    Ok(())
}

fn announce(grid: &Weak<RefCell<dyn GridPeer>>, toolbar: &Weak<RefCell<dyn ToolbarPeer>>) {
    let (Some(grid), Some(toolbar)) = (grid.upgrade(), toolbar.upgrade()) else {
        warn!("Pairing dropped before toolbar options were announced");
        return;
    };
    let Ok(options) = grid.try_borrow().map(|grid| grid.toolbar_options()) else {
        warn!("Grid busy, toolbar options not announced");
        return;
    };
    match toolbar.try_borrow_mut() {
        Ok(mut toolbar) => toolbar.receive(&ToolbarNotice::OptionsChanged(options)),
        Err(_) => warn!("Toolbar busy, toolbar options not announced"),
    }
}

// =============================================================================
// Toolbar
// =============================================================================

/// One entry of the export menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    pub format: String,
    pub label: String,
}

/// What the toolbar currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarView {
    pub visible: bool,
    pub title: String,
    /// Search box placeholder, absent when search is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_placeholder: Option<String>,
    pub search_text: String,
    /// Empty when export is disabled.
    pub export_menu: Vec<ExportEntry>,
    pub language: String,
}

/// Companion toolbar of one grid.
pub struct Toolbar {
    options: ToolbarOptions,
    localizer: Localizer,
    grid: Option<Weak<RefCell<dyn GridPeer>>>,
    search_text: String,
    pending_search: Option<String>,
    renderer: Option<Box<dyn Fn(&ToolbarView)>>,
}

impl fmt::Debug for Toolbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbar")
            .field("options", &self.options)
            .field("paired", &self.is_paired())
            .field("search_text", &self.search_text)
            .field("pending_search", &self.pending_search)
            .finish_non_exhaustive()
    }
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolbar {
    #[must_use]
    pub fn new() -> Self {
        Self::with_localizer(Localizer::new())
    }

    #[must_use]
    pub fn with_localizer(localizer: Localizer) -> Self {
        let options = ToolbarOptions {
            language: localizer.language().to_string(),
            ..ToolbarOptions::default()
        };
        Self {
            options,
            localizer,
            grid: None,
            search_text: String::new(),
            pending_search: None,
            renderer: None,
        }
    }

    /// Installs a render callback and draws once.
    pub fn set_renderer(&mut self, renderer: impl Fn(&ToolbarView) + 'static) {
        self.renderer = Some(Box::new(renderer));
        self.render();
    }

    #[must_use]
    pub fn options(&self) -> &ToolbarOptions {
        &self.options
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.localizer.language()
    }

    /// Returns true while the paired grid is alive.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.grid.as_ref().is_some_and(|grid| grid.strong_count() > 0)
    }

    /// Search text waiting for a grid, if any.
    #[must_use]
    pub fn pending_search(&self) -> Option<&str> {
        self.pending_search.as_deref()
    }

    /// Derives the visible affordances from the current options.
    #[must_use]
    pub fn view(&self) -> ToolbarView {
        let export_menu = if self.options.export {
            ExportFormat::ALL
                .iter()
                .map(|format| ExportEntry {
                    format: format.as_str().to_string(),
                    label: self.localizer.translate(format.label_key(), &[]),
                })
                .collect()
        } else {
            Vec::new()
        };
        ToolbarView {
            visible: self.options.visible,
            title: self.localizer.translate(TranslationKey::TableTitle, &[]),
            search_placeholder: self
                .options
                .search
                .then(|| self.localizer.translate(TranslationKey::SearchPlaceholder, &[])),
            search_text: self.search_text.clone(),
            export_menu,
            language: self.localizer.language().to_string(),
        }
    }

    /// Forwards user search text to the paired grid.
    ///
    /// Without a live grid the text is kept and delivered on pairing, and
    /// [`GridError::PeerUnavailable`] tells the host to run discovery again.
    pub fn search(&mut self, term: &str) -> Result<()> {
        self.search_text = term.to_string();
        match self.deliver(term) {
            Ok(()) => {
                self.pending_search = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Search kept until a grid is paired");
                self.pending_search = Some(term.to_string());
                Err(err)
            }
        }
    }

    fn deliver(&self, term: &str) -> Result<()> {
        let grid = self.live_grid()?;
        let mut grid = grid
            .try_borrow_mut()
            .map_err(|_| GridError::PeerUnavailable("grid is busy".into()))?;
        grid.deliver_search(term);
        debug!(toolbar.term = %term, "Search delivered");
        Ok(())
    }

    /// Hands the grid's raw data and columns to `encoder`.
    pub fn export(&self, format: ExportFormat, encoder: &dyn ExportEncoder) -> Result<()> {
        if !self.options.export {
            return Err(GridError::invalid_shape(
                "export",
                "export is disabled for this toolbar",
            ));
        }
        let snapshot = {
            let grid = self.live_grid()?;
            let grid = grid
                .try_borrow()
                .map_err(|_| GridError::PeerUnavailable("grid is busy".into()))?;
            grid.export_snapshot()
        };
        info!(
            export.format = %format,
            export.rows = snapshot.rows.len(),
            "Export requested"
        );
        encoder.export(format, &snapshot)
    }

    fn live_grid(&self) -> Result<Rc<RefCell<dyn GridPeer>>> {
        self.grid
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| GridError::PeerUnavailable("no grid paired with this toolbar".into()))
    }

    fn render(&self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let view = self.view();
        if catch_unwind(AssertUnwindSafe(|| renderer(&view))).is_err() {
            warn!("Toolbar renderer panicked");
        }
    }
}

impl ToolbarPeer for Toolbar {
    fn receive(&mut self, notice: &ToolbarNotice) {
        match notice {
            ToolbarNotice::OptionsChanged(options) => {
                self.options = options.clone();
                let applied = self.localizer.set_language(&options.language).to_string();
                self.options.language = applied;
            }
            ToolbarNotice::LanguageChanged(language) => {
                let applied = self.localizer.set_language(language).to_string();
                self.options.language = applied;
            }
        }
        debug!(toolbar.options = ?self.options, "Toolbar options received");
        self.render();
    }

    fn attach_grid(&mut self, grid: Weak<RefCell<dyn GridPeer>>) {
        self.grid = Some(grid);
        if let Some(term) = self.pending_search.take() {
            if let Err(err) = self.deliver(&term) {
                warn!(error = %err, "Pending search not delivered");
                self.pending_search = Some(term);
            }
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Element tree the discovery protocol walks.
pub trait ElementTree {
    type Element: Clone + PartialEq;

    /// Lowercase tag name.
    fn tag_name(&self, element: &Self::Element) -> String;
    fn next_sibling(&self, element: &Self::Element) -> Option<Self::Element>;
    fn previous_sibling(&self, element: &Self::Element) -> Option<Self::Element>;
    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;
    /// First descendant of `root` with `tag`, in document order.
    fn find_descendant(&self, root: &Self::Element, tag: &str) -> Option<Self::Element>;
    /// First element in the whole document with `tag`.
    fn find_in_document(&self, tag: &str) -> Option<Self::Element>;
}

/// Which lookup found the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStep {
    Cached,
    NextSibling,
    PreviousSibling,
    Parent,
    /// Inside the ancestor this many levels above the parent.
    Ancestor(usize),
    Document,
}

/// Looks for the nearest element tagged `tag`, starting from `origin`.
///
/// Order: next sibling, previous sibling, inside the parent, inside each
/// further ancestor, then anywhere in the document. `origin` itself is never
/// returned.
pub fn locate<T: ElementTree>(
    tree: &T,
    origin: &T::Element,
    tag: &str,
) -> Option<(T::Element, DiscoveryStep)> {
    let tagged = |element: &T::Element| tree.tag_name(element) == tag && element != origin;

    if let Some(next) = tree.next_sibling(origin).filter(|e| tagged(e)) {
        return Some((next, DiscoveryStep::NextSibling));
    }
    if let Some(previous) = tree.previous_sibling(origin).filter(|e| tagged(e)) {
        return Some((previous, DiscoveryStep::PreviousSibling));
    }

    let mut container = tree.parent(origin);
    let mut depth = 0;
    while let Some(current) = container {
        if let Some(found) = tree.find_descendant(&current, tag).filter(|e| tagged(e)) {
            let step = if depth == 0 {
                DiscoveryStep::Parent
            } else {
                DiscoveryStep::Ancestor(depth)
            };
            return Some((found, step));
        }
        container = tree.parent(&current);
        depth += 1;
    }

    tree.find_in_document(tag)
        .filter(|e| tagged(e))
        .map(|found| (found, DiscoveryStep::Document))
}

/// Pairing state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Unpaired,
    /// First lookup failed; one retry is scheduled.
    Waiting,
    Paired,
    /// The retry failed too. Operating without a peer.
    Abandoned,
}

/// Discovery state machine for one element looking for its peer.
#[derive(Debug)]
pub struct Discovery<E> {
    target_tag: String,
    state: PairingState,
    cached: Option<E>,
}

impl<E: Clone + PartialEq + 'static> Discovery<E> {
    /// Starts unpaired, looking for elements tagged `target_tag`.
    #[must_use]
    pub fn new(target_tag: impl Into<String>) -> Self {
        Self {
            target_tag: target_tag.into(),
            state: PairingState::Unpaired,
            cached: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> PairingState {
        self.state
    }

    #[must_use]
    pub fn cached(&self) -> Option<&E> {
        self.cached.as_ref()
    }

    /// Forgets the cached peer, e.g. after it was removed from the page.
    pub fn reset(&mut self) {
        self.cached = None;
        self.state = PairingState::Unpaired;
    }

    /// One lookup, cached reference first.
    ///
    /// A miss moves `Unpaired` to `Waiting` and `Waiting` to `Abandoned`.
    pub fn attempt<T>(&mut self, tree: &T, origin: &E) -> Option<(E, DiscoveryStep)>
    where
        T: ElementTree<Element = E>,
    {
        if let Some(cached) = &self.cached {
            return Some((cached.clone(), DiscoveryStep::Cached));
        }
        match locate(tree, origin, &self.target_tag) {
            Some((found, step)) => {
                info!(discovery.target = %self.target_tag, discovery.step = ?step, "Peer found");
                self.cached = Some(found.clone());
                self.state = PairingState::Paired;
                Some((found, step))
            }
            None => {
                self.state = match self.state {
                    PairingState::Unpaired => PairingState::Waiting,
                    _ => {
                        warn!(
                            error = %GridError::PeerUnavailable(self.target_tag.clone()),
                            "Discovery abandoned, continuing without peer"
                        );
                        PairingState::Abandoned
                    }
                };
                None
            }
        }
    }

    /// Looks up the peer now and, on a miss, once more after
    /// [`DISCOVERY_RETRY_DELAY`]. `on_found` runs at most once.
    pub fn run<T, F>(
        discovery: &Rc<RefCell<Self>>,
        tree: Rc<T>,
        origin: E,
        scheduler: &dyn Scheduler,
        on_found: F,
    ) where
        T: ElementTree<Element = E> + 'static,
        F: FnOnce(E, DiscoveryStep) + 'static,
    {
        let found = discovery.borrow_mut().attempt(tree.as_ref(), &origin);
        if let Some((peer, step)) = found {
            on_found(peer, step);
            return;
        }
        if discovery.borrow().state() != PairingState::Waiting {
            return;
        }

        debug!(delay = ?DISCOVERY_RETRY_DELAY, "Discovery retry scheduled");
        let discovery = Rc::downgrade(discovery);
        scheduler.defer(
            DISCOVERY_RETRY_DELAY,
            Box::new(move || {
                let Some(discovery) = discovery.upgrade() else {
                    return;
                };
                let found = discovery.borrow_mut().attempt(tree.as_ref(), &origin);
                if let Some((peer, step)) = found {
                    on_found(peer, step);
                }
            }),
        );
    }
}

// =============================================================================
// In-memory tree
// =============================================================================

/// Handle of a node in a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element tree for native hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    nodes: Vec<Node>,
}

impl MemoryTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level element.
    pub fn add_root(&mut self, tag: &str) -> NodeId {
        self.push(tag, None)
    }

    /// Appends an element as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.push(tag, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            parent,
            children: Vec::new(),
        });
        id
    }

    fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.nodes[id.0].parent {
            Some(parent) => &self.nodes[parent.0].children,
            None => &[],
        }
    }

    fn sibling_at(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let position = siblings.iter().position(|s| *s == id)?;
        position
            .checked_add_signed(offset)
            .and_then(|i| siblings.get(i))
            .copied()
    }

    fn first_below(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[id.0].children.iter().find_map(|child| {
            if self.nodes[child.0].tag == tag {
                Some(*child)
            } else {
                self.first_below(*child, tag)
            }
        })
    }
}

impl ElementTree for MemoryTree {
    type Element = NodeId;

    fn tag_name(&self, element: &NodeId) -> String {
        self.nodes[element.0].tag.clone()
    }

    fn next_sibling(&self, element: &NodeId) -> Option<NodeId> {
        self.sibling_at(*element, 1)
    }

    fn previous_sibling(&self, element: &NodeId) -> Option<NodeId> {
        self.sibling_at(*element, -1)
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.nodes[element.0].parent
    }

    fn find_descendant(&self, root: &NodeId, tag: &str) -> Option<NodeId> {
        self.first_below(*root, tag)
    }

    fn find_in_document(&self, tag: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .find_map(|(index, node)| {
                if node.tag == tag {
                    Some(NodeId(index))
                } else {
                    self.first_below(NodeId(index), tag)
                }
            })
    }
}
