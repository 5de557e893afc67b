//! # Eligibility Benchmarks
//!
//! Performance benchmarks for the tpo-core matcher and resolver.
//!
//! Run with: `cargo bench -p tpo-core`

use chrono::{DateTime, Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tpo_core::{
    Eligibility, Gender, GradeHundredths, Phase, PhaseStatus, StudentProfile, eligible,
};

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).expect("valid timestamp")
}

/// Create a cohort of N students with spread-out grades.
fn create_cohort(size: usize) -> Vec<StudentProfile> {
    (0..size)
        .map(|i| StudentProfile {
            gender: Some(if i % 2 == 0 { Gender::Female } else { Gender::Male }),
            sem_marks: (0..8)
                .map(|term| GradeHundredths::new(((i * 13 + term * 7) % 1000) as u32))
                .collect(),
            live_backlog: i % 5 == 0,
            ..StudentProfile::default()
        })
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_eligibility_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("eligibility_matching");

    let rule = Eligibility {
        min_grade: GradeHundredths::new(650),
        live_backlog: Some(false),
        gender: None,
    };

    for size in [100, 1000, 10000].iter() {
        let cohort = create_cohort(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let eligible_count = cohort
                    .iter()
                    .filter(|student| eligible(student, &rule))
                    .count();
                black_box(eligible_count)
            });
        });
    }

    group.finish();
}

fn bench_phase_status_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("phase_status_resolution");

    let now = epoch();
    for size in [100, 1000, 10000].iter() {
        let phases: Vec<Phase> = (0..*size)
            .map(|i| Phase {
                title: format!("Phase {i}"),
                description: String::new(),
                requested_date: None,
                suggested_date: None,
                scheduled_date: (i % 3 != 0)
                    .then(|| now + Duration::days((i as i64 % 60) - 30)),
                completed: i % 7 == 0,
                results: Vec::new(),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let statuses: Vec<PhaseStatus> = phases
                    .iter()
                    .map(|phase| PhaseStatus::resolve(phase, now))
                    .collect();
                black_box(statuses)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_eligibility_matching, bench_phase_status_resolution);

criterion_main!(benches);
