//! Outbound state-change notifications.
//!
//! The grid emits a [`GridEvent`] after each mutation that a host may want to
//! observe. Hosts register listeners on the grid's [`EventBus`]; a panicking
//! listener is logged and never interrupts the others.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::model::{Row, SortOptions, ToolbarOptions};
use crate::pipeline::Criteria;

/// A state change of one grid instance.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Snapshot of the selection after a toggle or clear.
    SelectionChange(Vec<Row>),
    /// Sort options after a header click.
    SortChange(SortOptions),
    /// New 1-based page number.
    PageChange(usize),
    /// Criteria applied and the number of rows they kept.
    Filtered { criteria: Criteria, result_count: usize },
    /// Toolbar options after a merge.
    ToolbarOptionsChange(ToolbarOptions),
    /// Language actually applied after fallback.
    LanguageChange { language: String },
}

impl GridEvent {
    /// Canonical event names, in the order hosts usually subscribe to them.
    pub const NAMES: [&'static str; 6] = [
        "selectionChange",
        "sortChange",
        "pageChange",
        "filtered",
        "toolbarOptionsChange",
        "languageChange",
    ];

    /// Canonical camelCase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectionChange(_) => "selectionChange",
            Self::SortChange(_) => "sortChange",
            Self::PageChange(_) => "pageChange",
            Self::Filtered { .. } => "filtered",
            Self::ToolbarOptionsChange(_) => "toolbarOptionsChange",
            Self::LanguageChange { .. } => "languageChange",
        }
    }

    /// JSON payload carried in a custom event's `detail`.
    #[must_use]
    pub fn detail(&self) -> Value {
        match self {
            Self::SelectionChange(rows) => {
                Value::Array(rows.iter().map(|row| Value::clone(row)).collect())
            }
            Self::SortChange(options) => json!({
                "field": options.field,
                "direction": options.direction,
            }),
            Self::PageChange(page) => json!(page),
            Self::Filtered {
                criteria,
                result_count,
            } => json!({
                "criteria": criteria.to_value(),
                "resultCount": result_count,
            }),
            Self::ToolbarOptionsChange(options) => json!(options),
            Self::LanguageChange { language } => json!({ "language": language }),
        }
    }
}

/// Identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Entry = (ListenerId, Rc<dyn Fn(&GridEvent)>);

/// Listener registry for one grid.
pub struct EventBus {
    listeners: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &format!("{} listeners", self.len()))
            .field("next_id", &self.next_id.get())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Registers a listener for every event.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        debug!(events.listener_id = id.0, "Grid listener registered");
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(entry, _)| *entry != id);
        if listeners.len() != before {
            debug!(events.listener_id = id.0, "Grid listener removed");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every listener registered at the time of the call.
    pub fn emit(&self, event: &GridEvent) {
        let listeners: Vec<Entry> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        debug!(event = event.name(), listeners = listeners.len(), "Emitting grid event");
        for (id, listener) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                warn!(
                    events.listener_id = id.0,
                    event = event.name(),
                    "Grid listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn names_match_variants() {
        let events = [
            GridEvent::SelectionChange(Vec::new()),
            GridEvent::SortChange(SortOptions::asc("age")),
            GridEvent::PageChange(2),
            GridEvent::Filtered {
                criteria: Criteria::new(),
                result_count: 0,
            },
            GridEvent::ToolbarOptionsChange(ToolbarOptions::default()),
            GridEvent::LanguageChange {
                language: "en".into(),
            },
        ];
        let names: Vec<&str> = events.iter().map(GridEvent::name).collect();
        assert_eq!(names, GridEvent::NAMES);
    }

    #[test]
    fn details_are_json_payloads() {
        let row = Arc::new(json!({"id": 1}));
        assert_eq!(
            GridEvent::SelectionChange(vec![row]).detail(),
            json!([{"id": 1}])
        );
        assert_eq!(
            GridEvent::SortChange(SortOptions::desc("age")).detail(),
            json!({"field": "age", "direction": "desc"})
        );
        assert_eq!(
            GridEvent::Filtered {
                criteria: Criteria::search("ankara"),
                result_count: 1
            }
            .detail(),
            json!({"criteria": {"searchTerm": "ankara"}, "resultCount": 1})
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let id = bus.subscribe(move |_: &GridEvent| counter.set(counter.get() + 1));

        bus.emit(&GridEvent::PageChange(1));
        bus.unsubscribe(id);
        bus.emit(&GridEvent::PageChange(2));
        assert_eq!(seen.get(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn panicking_listener_does_not_stop_others() {
        let bus = EventBus::new();
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        bus.subscribe(|_: &GridEvent| panic!("listener failure"));
        bus.subscribe(move |_: &GridEvent| flag.set(true));

        bus.emit(&GridEvent::PageChange(1));
        assert!(seen.get());
    }
}
