#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use zengrid::events::GridEvent;
use zengrid::grid::Grid;
use zengrid::model::Column;

/// The 10-user sample dataset. Exactly one user lives in Ankara.
pub fn users() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Ahmet Yılmaz", "age": 34, "city": "İstanbul", "active": true,
               "address": {"zip": "34000"}, "tags": ["admin", "editor"]}),
        json!({"id": 2, "name": "Ayşe Demir", "age": 28, "city": "Ankara", "active": true,
               "address": {"zip": "06000"}, "tags": ["editor"]}),
        json!({"id": 3, "name": "Mehmet Kaya", "age": 45, "city": "İzmir", "active": false,
               "address": {"zip": "35000"}, "tags": []}),
        json!({"id": 4, "name": "Fatma Çelik", "age": 31, "city": "Bursa", "active": true,
               "address": {"zip": "16000"}, "tags": ["viewer"]}),
        json!({"id": 5, "name": "Ali Şahin", "age": 52, "city": "Antalya", "active": false,
               "address": {"zip": "07000"}, "tags": ["viewer"]}),
        json!({"id": 6, "name": "Zeynep Arslan", "age": 26, "city": "Adana", "active": true,
               "address": {"zip": "01000"}, "tags": ["admin"]}),
        json!({"id": 7, "name": "Mustafa Doğan", "age": 39, "city": "Konya", "active": true,
               "address": {"zip": "42000"}, "tags": []}),
        json!({"id": 8, "name": "Elif Koç", "age": 23, "city": "Eskişehir", "active": false,
               "address": {"zip": "26000"}, "tags": ["editor", "viewer"]}),
        json!({"id": 9, "name": "Emre Aydın", "age": 37, "city": "Trabzon", "active": true,
               "address": {"zip": "61000"}, "tags": ["viewer"]}),
        json!({"id": 10, "name": "Selin Öztürk", "age": 30, "city": "Gaziantep", "active": true,
               "address": {"zip": "27000"}, "tags": ["admin", "viewer"]}),
    ]
}

pub fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID").sortable(false),
        Column::new("name", "Name"),
        Column::new("age", "Age"),
        Column::new("city", "City"),
        Column::new("address.zip", "Zip"),
    ]
}

/// A grid loaded with [`users`] and [`columns`].
pub fn sample_grid() -> Grid {
    let mut grid = Grid::new();
    grid.set_columns(columns());
    grid.set_data(users());
    grid
}

/// Records every event the grid emits from now on.
pub fn record(grid: &Grid) -> Rc<RefCell<Vec<GridEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    grid.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

/// The `id` of every row, in order.
pub fn ids(rows: &[zengrid::model::Row]) -> Vec<i64> {
    rows.iter().filter_map(|row| row["id"].as_i64()).collect()
}

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a plain-text subscriber and returns what it logged at
/// `warn` and above.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}
