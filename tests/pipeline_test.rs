// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

mod common;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use common::{int_rows, row};
use rowflow::{record_to_row, row_to_record, Pipeline, Row, Value};
use serde::{Deserialize, Serialize};

#[test]
fn start_runs_for_side_effects_only() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let result = Pipeline::from_rows(int_rows("n", 1..=3))
        .apply(move |r| {
            sink.lock().expect("seen lock").push(r.value("n").clone());
            Ok(())
        })
        .start();
    assert!(result.is_completed());
    assert!(!result.in_background());
    assert_eq!(result.error_count(), 0);
    assert!(result.duration().is_some());
    assert_eq!(seen.lock().expect("seen lock").len(), 3);
}

#[test]
fn background_run_joins_through_the_result() {
    let (tx, rx) = mpsc::channel::<Row>();
    let result = Pipeline::from_iter(rx.into_iter())
        .transform(|mut r| {
            let n = r.value("n").as_i64().unwrap_or(0);
            r.set("n", n + 1);
            Ok(r)
        })
        .execute_in_thread();

    for r in int_rows("n", 1..=5) {
        tx.send(r).expect("send row");
    }
    // Closing the channel ends the source iterator and completes the run.
    drop(tx);
    result.wait();

    assert!(result.is_completed());
    assert!(!result.in_background());
    let out = result.into_rows();
    assert_eq!(out.len(), 5);
    assert_eq!(*out[0].value("n"), Value::Int(2));
    assert_eq!(*out[4].value("n"), Value::Int(6));
}

#[test]
fn start_in_thread_reports_progress_through_shared_state() {
    let (tx, rx) = mpsc::channel::<Row>();
    let result = Pipeline::from_iter(rx.into_iter()).start_in_thread();
    assert!(!result.is_completed());
    drop(tx);
    result.wait();
    assert!(result.is_completed());
    assert!(result.duration().is_some());
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct Sale {
    region: String,
    amount: i64,
}

#[test]
fn typed_records_flow_through_a_pipeline() {
    let sales = vec![
        Sale { region: "east".to_string(), amount: 10 },
        Sale { region: "west".to_string(), amount: 4 },
    ];
    let out = Pipeline::from_records(sales)
        .filter(|r| r.value("amount").as_i64().unwrap_or(0) > 5)
        .record()
        .into_rows();
    assert_eq!(out.len(), 1);
    let sale: Sale = row_to_record(&out[0]).expect("typed row");
    assert_eq!(sale.region, "east");
    assert_eq!(sale.amount, 10);
}

#[test]
fn record_conversion_round_trips() {
    let sale = Sale { region: "north".to_string(), amount: 7 };
    let row = record_to_row(&sale).expect("to row");
    let back: Sale = row_to_record(&row).expect("from row");
    assert_eq!(back, sale);
}

#[test]
fn transform_many_fans_rows_out_and_in() {
    let out = Pipeline::from_rows(int_rows("n", 1..=3))
        .transform_many(|r| {
            let n = r.value("n").as_i64().unwrap_or(0);
            Ok((0..n).map(|i| {
                let mut copy = r.clone();
                copy.set("i", i);
                copy
            })
            .collect())
        })
        .record()
        .into_rows();
    // 1 + 2 + 3 copies.
    assert_eq!(out.len(), 6);
}

#[test]
fn union_completes_only_after_every_branch() {
    let pipeline = Pipeline::new();
    let evens = pipeline.rows(int_rows("n", [2, 4]));
    let odds = pipeline.rows(int_rows("n", [1, 3, 5]));
    let merged = evens.union(&odds).log_count("merged");
    let result = merged.record();
    assert!(result.is_completed());
    assert_eq!(result.count(), 5);
    assert!(merged.is_completed());
}

#[test]
fn a_shared_chain_feeds_several_terminals_once() {
    let pipeline = Pipeline::new();
    let source = pipeline.rows(int_rows("n", 1..=4));
    let evens = source.filter(|r| r.value("n").as_i64().unwrap_or(0) % 2 == 0);
    let doubled = evens.transform(|mut r| {
        let n = r.value("n").as_i64().unwrap_or(0);
        r.set("n", n * 2);
        Ok(r)
    });
    let result = doubled.record();
    assert_eq!(result.count(), 2);
    // The source already completed; recording another node of the same
    // pipeline does not replay it.
    let again = evens.record();
    assert!(again.is_completed());
    assert_eq!(again.count(), 0);
    assert_eq!(source.rows_seen(), 4);
}

#[test]
fn handles_report_names_and_counts() {
    let pipeline = Pipeline::new();
    let source = pipeline.rows(vec![row(&[("k", Value::Int(1))])]).named("numbers");
    assert_eq!(source.display_name(), "numbers");
    assert_eq!(source.rows_seen(), 0);
    let _ = source.start();
    assert_eq!(source.rows_seen(), 1);
}
