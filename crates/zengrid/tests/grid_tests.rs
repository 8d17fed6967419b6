//! Integration tests for the grid state controller.
//!
//! Scenarios run against the 10-user sample dataset in `common`.

#![forbid(unsafe_code)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{capture_warnings, ids, record, sample_grid, users};
use serde_json::{Value, json};
use zengrid::events::GridEvent;
use zengrid::grid::{Grid, GridView};
use zengrid::model::{GridOptions, PaginationOptions, Row, SortDirection, SortOptions, ToolbarOptions};
use zengrid::pipeline::{Criteria, Criterion};

// =============================================================================
// Scenarios
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn scenario_a_pagination_and_page_size_reset() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(3)));

        assert_eq!(ids(&grid.visible_rows()), vec![1, 2, 3]);
        assert_eq!(grid.pagination_options().map(|p| p.total_items), Some(10));
        assert_eq!(grid.total_pages(), 4);

        grid.set_page(4);
        assert_eq!(ids(&grid.visible_rows()), vec![10]);

        grid.set_page_size(10);
        assert_eq!(grid.current_page(), 1);
        assert_eq!(grid.visible_rows().len(), 10);
    }

    #[test]
    fn scenario_b_search_finds_the_ankara_user() {
        let mut grid = sample_grid();
        grid.filter_value(&json!({"searchTerm": "ankara"}));
        assert_eq!(ids(grid.filtered_rows()), vec![2]);

        grid.filter_value(&json!("ANKARA"));
        assert_eq!(ids(grid.filtered_rows()), vec![2]);
    }

    #[test]
    fn scenario_c_empty_search_keeps_everything_in_order() {
        let mut grid = sample_grid();
        grid.filter_value(&json!({"searchTerm": ""}));
        assert_eq!(ids(grid.filtered_rows()), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn scenario_d_double_header_click_sorts_descending() {
        let mut grid = sample_grid();
        assert!(grid.sort_options().is_none());
        grid.click_header("age");
        assert_eq!(grid.sort_options(), Some(&SortOptions::asc("age")));
        grid.click_header("age");
        assert_eq!(grid.sort_options(), Some(&SortOptions::desc("age")));
        assert_eq!(ids(&grid.filtered_rows()[..3]), vec![5, 3, 7]);
    }

    #[test]
    fn scenario_e_toolbar_options_merge_and_notify() {
        let mut grid = sample_grid();
        let events = record(&grid);
        grid.set_toolbar_options(&json!({"search": false}));

        let expected = ToolbarOptions {
            visible: true,
            search: false,
            export: true,
            language: "en".into(),
        };
        assert_eq!(grid.toolbar_options(), &expected);
        assert_eq!(
            *events.borrow(),
            vec![GridEvent::ToolbarOptionsChange(expected.clone())]
        );
        assert_eq!(
            events.borrow()[0].detail(),
            json!({"visible": true, "search": false, "export": true, "language": "en"})
        );
    }

    #[test]
    fn scenario_f_unsupported_language_falls_back() {
        let mut grid = sample_grid();
        grid.set_language("tr");
        assert_eq!(grid.language(), "tr");

        let events = record(&grid);
        let ((), logs) = capture_warnings(|| grid.set_language("xx"));
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Unsupported language"), "{logs}");
        assert!(logs.contains("i18n.requested=xx"), "{logs}");
        assert_eq!(grid.language(), "en");
        assert_eq!(grid.toolbar_options().language, "en");
        assert_eq!(
            *events.borrow(),
            vec![GridEvent::LanguageChange {
                language: "en".into()
            }]
        );
    }
}

// =============================================================================
// Filtering
// =============================================================================

mod filter_tests {
    use super::*;

    #[test]
    fn filter_resets_page_and_reports_count() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(2)));
        grid.set_page(3);
        let events = record(&grid);

        grid.filter(Criteria::new().with("active", Criterion::Bool(true)));
        assert_eq!(grid.current_page(), 1);
        assert_eq!(grid.pagination_options().map(|p| p.total_items), Some(7));

        let log = events.borrow();
        let GridEvent::Filtered { result_count, .. } = &log[0] else {
            panic!("expected a filtered event, got {:?}", log[0]);
        };
        assert_eq!(*result_count, 7);
        assert_eq!(log[0].detail()["resultCount"], 7);
        assert_eq!(log[0].detail()["criteria"], json!({"active": true}));
    }

    #[test]
    fn null_and_empty_criteria_reset_to_raw_data() {
        let mut grid = sample_grid();
        grid.search("ankara");
        grid.filter_value(&Value::Null);
        assert_eq!(grid.filtered_rows().len(), 10);

        grid.search("ankara");
        grid.filter_value(&json!({}));
        assert_eq!(grid.filtered_rows().len(), 10);
    }

    #[test]
    fn wrong_shaped_criteria_keep_state() {
        let mut grid = sample_grid();
        grid.search("mehmet");
        let before = ids(grid.filtered_rows());
        let events = record(&grid);
        grid.filter_value(&json!(42));
        assert_eq!(ids(grid.filtered_rows()), before);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn field_criteria_by_type() {
        let mut grid = sample_grid();
        grid.filter_value(&json!({"age": 45}));
        assert_eq!(ids(grid.filtered_rows()), vec![3]);

        grid.filter_value(&json!({"city": ["Konya", "Bursa"]}));
        assert_eq!(ids(grid.filtered_rows()), vec![4, 7]);

        grid.filter_value(&json!({"address.zip": "000", "active": false}));
        assert_eq!(ids(grid.filtered_rows()), vec![3, 5, 8]);

        grid.filter_value(&json!({"searchTerm": "viewer", "age": null}));
        assert_eq!(ids(grid.filtered_rows()), vec![4, 5, 8, 9, 10]);
    }

    #[test]
    fn search_term_overrides_field_criteria() {
        let mut grid = sample_grid();
        grid.filter_value(&json!({"searchTerm": "admin", "active": false}));
        assert_eq!(ids(grid.filtered_rows()), vec![1, 6, 10]);

        grid.filter_value(&json!({"searchTerm": " ", "age": 45}));
        assert_eq!(grid.filtered_rows().len(), 10);

        grid.filter_value(&json!({"searchTerm": null, "city": "Bursa"}));
        assert_eq!(grid.filtered_rows().len(), 10);
    }

    #[test]
    fn repeated_filters_derive_from_raw_data() {
        let mut grid = sample_grid();
        grid.search("ankara");
        grid.search("bursa");
        assert_eq!(ids(grid.filtered_rows()), vec![4]);
    }
}

// =============================================================================
// Sorting
// =============================================================================

mod sort_tests {
    use super::*;

    #[test]
    fn sort_survives_filter_and_data_replacement() {
        let mut grid = sample_grid();
        grid.set_sort_options(Some(SortOptions::desc("age")));
        grid.filter(Criteria::new().with("active", Criterion::Bool(true)));
        assert_eq!(ids(grid.filtered_rows()), vec![7, 9, 1, 4, 10, 2, 6]);

        grid.set_data(users());
        assert_eq!(ids(&grid.filtered_rows()[..2]), vec![5, 3]);
    }

    #[test]
    fn none_direction_keeps_order() {
        let mut grid = sample_grid();
        grid.set_sort_options(Some(SortOptions::new("age", SortDirection::None)));
        assert_eq!(ids(grid.filtered_rows()), (1..=10).collect::<Vec<_>>());
        grid.set_sort_options(Some(SortOptions::asc("")));
        assert_eq!(ids(grid.filtered_rows()), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn clicking_another_column_restarts_ascending() {
        let mut grid = sample_grid();
        let events = record(&grid);
        grid.click_header("age");
        grid.click_header("age");
        grid.click_header("name");
        assert_eq!(grid.sort_options(), Some(&SortOptions::asc("name")));
        assert_eq!(events.borrow().len(), 3);
        assert_eq!(
            events.borrow()[1].detail(),
            json!({"field": "age", "direction": "desc"})
        );
    }

    #[test]
    fn nested_fields_sort() {
        let mut grid = sample_grid();
        grid.set_sort_options(Some(SortOptions::asc("address.zip")));
        assert_eq!(ids(&grid.filtered_rows()[..3]), vec![6, 2, 5]);
    }

    #[test]
    fn custom_comparator_swaps_operands_in_descending_order() {
        let mut grid = sample_grid();
        let by_id = |a: &Value, b: &Value| a["id"].as_i64().cmp(&b["id"].as_i64());
        grid.set_sort_options(Some(SortOptions::desc("id").comparator(by_id)));
        assert_eq!(ids(grid.filtered_rows()), (1..=10).rev().collect::<Vec<_>>());
    }
}

// =============================================================================
// Pagination
// =============================================================================

mod pagination_tests {
    use super::*;

    #[test]
    fn out_of_range_pages_are_ignored() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(3)));
        let events = record(&grid);
        grid.set_page(0);
        grid.set_page(5);
        assert_eq!(grid.current_page(), 1);
        assert!(events.borrow().is_empty());

        grid.set_page(2);
        assert_eq!(*events.borrow(), vec![GridEvent::PageChange(2)]);
    }

    #[test]
    fn filter_shrinking_results_clamps_page() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(3)));
        grid.set_page(4);
        grid.search("ankara");
        assert_eq!(grid.current_page(), 1);
        assert_eq!(grid.total_pages(), 1);
        assert!(grid.pagination_view().is_none());
    }

    #[test]
    fn removing_pagination_shows_all_rows() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(3)));
        grid.set_pagination_options(None);
        assert_eq!(grid.visible_rows().len(), 10);
        assert_eq!(grid.total_pages(), 1);
    }

    #[test]
    fn pagination_view_in_turkish() {
        let mut grid = sample_grid();
        grid.set_language("tr");
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(3)));
        grid.set_page(2);
        let view = grid.pagination_view().unwrap();
        assert_eq!(view.info, "4-6 / 10");
        assert_eq!(view.pages, vec![1, 2, 3, 4]);
        assert_eq!(view.page_size_options, Some(vec![5, 10, 25, 50, 100]));
    }
}

// =============================================================================
// Selection
// =============================================================================

mod selection_tests {
    use super::*;

    fn row(grid: &Grid, index: usize) -> Row {
        Row::clone(&grid.data()[index])
    }

    #[test]
    fn single_select_replaces() {
        let mut grid = sample_grid();
        let events = record(&grid);
        grid.select_row(&row(&grid, 0));
        grid.select_row(&row(&grid, 1));
        assert_eq!(ids(&grid.selected_rows()), vec![2]);

        let log = events.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].name(), "selectionChange");
        assert_eq!(log[1].detail()[0]["id"], 2);
    }

    #[test]
    fn multi_select_toggles() {
        let mut grid = sample_grid();
        grid.set_multi_selectable(true);
        grid.select_row(&row(&grid, 0));
        grid.select_row(&row(&grid, 4));
        grid.select_row(&row(&grid, 0));
        assert_eq!(ids(&grid.selected_rows()), vec![5]);
    }

    #[test]
    fn selection_survives_sort_and_filter_but_not_set_data() {
        let mut grid = sample_grid();
        grid.select_row(&row(&grid, 1));
        grid.click_header("age");
        grid.search("ankara");
        assert_eq!(ids(&grid.selected_rows()), vec![2]);
        assert!(grid.view().rows[0].selected);

        grid.set_data(users());
        assert!(grid.selected_rows().is_empty());
    }

    #[test]
    fn clear_selection_emits_empty_snapshot() {
        let mut grid = sample_grid();
        grid.select_row(&row(&grid, 1));
        let events = record(&grid);
        grid.clear_selection();
        assert_eq!(*events.borrow(), vec![GridEvent::SelectionChange(Vec::new())]);
    }

    #[test]
    fn turning_selection_off_clears_it() {
        let mut grid = sample_grid();
        grid.set_selectable(true);
        grid.click_row(2);
        assert_eq!(ids(&grid.selected_rows()), vec![3]);
        grid.set_selectable(false);
        assert!(grid.selected_rows().is_empty());
    }
}

// =============================================================================
// Configuration and rendering
// =============================================================================

mod configuration_tests {
    use super::*;

    #[test]
    fn options_round_trip_through_json() {
        let options = GridOptions::from_json(
            r#"{
                "columns": [{"field": "name", "header": "Name", "align": "center"}],
                "data": [{"name": "x"}],
                "paginationOptions": {"pageSize": 25},
                "toolbarOptions": {"export": false},
                "striped": false,
                "multiSelectable": true,
                "emptyMessage": "Nothing here"
            }"#,
        )
        .unwrap();
        let grid = Grid::from_options(options);
        assert!(!grid.display().striped);
        assert!(grid.display().multi_selectable);
        assert!(!grid.toolbar_options().export);
        assert!(grid.toolbar_options().search);
        assert_eq!(grid.pagination_options().map(|p| p.page_size), Some(25));
    }

    #[test]
    fn toolbar_language_applies_to_the_grid() {
        let mut grid = sample_grid();
        let events = record(&grid);
        grid.set_toolbar_options(&json!({"language": "tr"}));

        assert_eq!(grid.language(), "tr");
        assert_eq!(grid.language(), grid.toolbar_options().language);
        let names: Vec<&str> = events.borrow().iter().map(GridEvent::name).collect();
        assert_eq!(names, vec!["toolbarOptionsChange", "languageChange"]);

        grid.search("nobody");
        assert_eq!(
            grid.view().empty_message.as_deref(),
            Some("Görüntülenecek veri yok")
        );
    }

    #[test]
    fn options_agree_on_one_language() {
        let grid = Grid::from_options(
            GridOptions::from_json(r#"{"toolbarOptions": {"language": "tr"}}"#).unwrap(),
        );
        assert_eq!(grid.language(), "tr");
        assert_eq!(grid.toolbar_options().language, "tr");

        let grid = Grid::from_options(
            GridOptions::from_json(r#"{"language": "tr", "toolbarOptions": {"language": "xx"}}"#)
                .unwrap(),
        );
        assert_eq!(grid.language(), "tr");
        assert_eq!(grid.toolbar_options().language, "tr");
    }

    #[test]
    fn malformed_options_are_reported() {
        assert!(GridOptions::from_json("{columns: }").is_err());
    }

    #[test]
    fn renderer_sees_every_mutation() {
        let mut grid = sample_grid();
        let views: Rc<RefCell<Vec<GridView>>> = Rc::default();
        let sink = Rc::clone(&views);
        grid.set_renderer(move |view: &GridView| sink.borrow_mut().push(view.clone()));
        grid.search("mehmet");
        grid.set_height(Some("400px".into()));

        let views = views.borrow();
        assert_eq!(views.len(), 3);
        assert_eq!(views[1].rows.len(), 1);
        assert_eq!(views[2].height.as_deref(), Some("400px"));
        assert_eq!(views[2].headers[4].label, "Zip");
        assert_eq!(views[2].rows[0].cells[4], "35000");
    }

    #[test]
    fn export_snapshot_uses_raw_data() {
        let mut grid = sample_grid();
        grid.search("ankara");
        let snapshot = grid.export_snapshot();
        assert_eq!(snapshot.rows.len(), 10);
        assert_eq!(snapshot.headers(), vec!["ID", "Name", "Age", "City", "Zip"]);
    }

    #[test]
    fn view_serializes_camel_case() {
        let mut grid = sample_grid();
        grid.set_pagination_options(Some(PaginationOptions::with_page_size(5)));
        let json = serde_json::to_value(grid.view()).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["flags"]["showHeader"], true);
        assert_eq!(json["headers"][1]["sort"], "none");
    }
}
