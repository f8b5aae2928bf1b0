//! Department headcount report.
//!
//! Groups employees by department, summarizes each group on a worker pool,
//! and prints the largest departments first.
//!
//! Run with `RUST_LOG=sluice=debug cargo run --example department_report`
//! to see each stage start and stop.

use sluice::collections::MinHeap;
use sluice::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Employee {
    name: &'static str,
    department: &'static str,
    salary: u32,
}

#[derive(Debug)]
struct Summary {
    department: &'static str,
    headcount: usize,
    payroll: u64,
}

fn roster() -> Vec<Employee> {
    [
        ("Alice", "HR", 52_000),
        ("Bob", "IT", 71_000),
        ("Charlie", "HR", 48_000),
        ("David", "IT", 83_000),
        ("Eve", "Finance", 90_000),
        ("Frank", "IT", 64_000),
        ("Grace", "Sales", 45_000),
        ("Heidi", "Finance", 77_000),
    ]
    .into_iter()
    .map(|(name, department, salary)| Employee {
        name,
        department,
        salary,
    })
    .collect()
}

#[tokio::main]
async fn main() -> sluice::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sluice=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    sluice::observability::init_metrics();

    let config = PipelineConfig::new()
        .with_name("department_report")
        .with_par_workers(2);
    let root = Context::with_config(config);
    let (ctx, _cancel) = root.with_timeout(Duration::from_secs(5));

    let summaries = pipe3(
        from_iter(&ctx, roster()),
        group_by(|e: &Employee| e.department),
        map_par(|group: Vec<Employee>| Summary {
            department: group[0].department,
            headcount: group.len(),
            payroll: group.iter().map(|e| u64::from(e.salary)).sum(),
        }),
        to_vec::<Summary>(),
    )
    .await?;

    // Largest department first, ties broken by name.
    let mut ranked = MinHeap::new(|a: &Summary, b: &Summary| {
        (b.headcount, a.department) < (a.headcount, b.department)
    });
    for summary in summaries {
        ranked.push(summary);
    }

    println!("{:<10} {:>5} {:>10}", "dept", "staff", "payroll");
    for s in ranked.into_sorted_vec() {
        println!("{:<10} {:>5} {:>10}", s.department, s.headcount, s.payroll);
    }

    let names = from_iter(&ctx, roster())
        .then(filter(|e: &Employee| e.salary > 70_000))
        .then(map(|e: Employee| e.name))
        .sink(to_vec::<&'static str>())
        .await?;
    println!("\nabove 70k: {}", names.join(", "));

    Ok(())
}
