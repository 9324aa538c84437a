criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(50)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        packing_flip_vector,
        unpacking_flip_vector,
        dispatching_a_task,
        reporting_classic_update,
        reporting_schedule_free_sgd_update,
        reporting_schedule_free_adam_update,
}

fn flips(d: usize) -> Vec<i8> {
    (0..d).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect()
}

fn packing_flip_vector(c: &mut criterion::Criterion) {
    let flips = flips(4096);
    c.bench_function("pack a 4096-axis flip vector", |b| {
        b.iter(|| spsa_coordinator::codec::pack(&flips))
    });
}

fn unpacking_flip_vector(c: &mut criterion::Criterion) {
    let flips = flips(4096);
    let packed = spsa_coordinator::codec::pack(&flips);
    c.bench_function("unpack a 4096-axis flip vector", |b| {
        b.iter(|| spsa_coordinator::codec::unpack(&packed, flips.len()).unwrap())
    });
}

fn make_run(variant: spsa_coordinator::Variant, d: usize) -> spsa_coordinator::Run {
    let config = spsa_coordinator::RunConfig {
        num_iter: 40_000,
        a_const: 4_000.0,
        alpha: 0.602,
        gamma: 0.101,
        variant,
        sf_lr: 0.01,
        sf_beta1: 0.9,
        sf_beta2: 0.999,
        sf_eps: 1e-8,
    };
    let params = (0..d)
        .map(|i| {
            (
                spsa_coordinator::ParamSpec {
                    name: format!("w{i}"),
                    min: -1000.0,
                    max: 1000.0,
                    c_end: 1.0,
                    r_end: 0.002,
                },
                0.0,
            )
        })
        .collect();
    spsa_coordinator::Run::new(config, params).expect("valid bounds")
}

fn dispatching_a_task(c: &mut criterion::Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let run = make_run(spsa_coordinator::Variant::Classic, 1024);
    c.bench_function("dispatch a 1024-axis task", |b| {
        b.iter(|| rt.block_on(run.dispatch(1_000_000)))
    });
}

fn reporting_classic_update(c: &mut criterion::Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let run = make_run(spsa_coordinator::Variant::Classic, 1024);
    bench_report(c, &rt, &run, "apply a classic report (1024 axes)");
}

fn reporting_schedule_free_sgd_update(c: &mut criterion::Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let run = make_run(spsa_coordinator::Variant::ScheduleFreeSgd, 1024);
    bench_report(c, &rt, &run, "apply a schedule-free SGD report (1024 axes)");
}

fn reporting_schedule_free_adam_update(c: &mut criterion::Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let run = make_run(spsa_coordinator::Variant::ScheduleFreeAdam, 1024);
    bench_report(c, &rt, &run, "apply a schedule-free AdamW report (1024 axes)");
}

fn bench_report(
    c: &mut criterion::Criterion,
    rt: &tokio::runtime::Runtime,
    run: &spsa_coordinator::Run,
    label: &str,
) {
    let flips: Vec<u8> = spsa_coordinator::codec::pack(&flips(1024));
    c.bench_function(label, |b| {
        b.iter(|| {
            rt.block_on(async {
                let signature = run.signature().await;
                let req = spsa_coordinator::wire::ReportRequest {
                    k0: 0,
                    packed_flips: flips.clone(),
                    signature,
                    wins: 520,
                    losses: 480,
                    draws: 0,
                    num_games: 2000,
                };
                let _ = run.report(&req).await;
            })
        })
    });
}
