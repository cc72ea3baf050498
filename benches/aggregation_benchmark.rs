use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pitchtrace::config::StatsConfig;
use pitchtrace::possession::PossessionRecord;
use pitchtrace::stats::StatsAggregator;
use pitchtrace::tracks::{BBox, Point, TrackState, TrackTable};
use pitchtrace::windows::build_windows;

/// A clip with `players` tracks drifting across the pitch, each one missing
/// from every seventh frame
fn create_mock_tracks(frame_count: usize, players: u32) -> TrackTable {
    let mut tracks = TrackTable::with_frame_count(frame_count);
    for (f, frame) in tracks.frames.iter_mut().enumerate() {
        for id in 0..players {
            if (f + id as usize) % 7 == 0 {
                continue;
            }
            let x = (id * 40) as f32 + f as f32 * 0.5;
            let mut state = TrackState::new(BBox::new(x, 100.0, x + 20.0, 160.0));
            state.position = Some(Point::new(x + 10.0, 160.0));
            state.speed_kmh = Some((f % 30) as f32);
            state.distance = Some(f as f32 * 0.2);
            state.team = Some((id % 2 + 1) as u8);
            state.has_ball = f % players as usize == id as usize;
            frame.players.insert(id + 2, state);
        }
    }
    tracks
}

fn benchmark_windowing(c: &mut Criterion) {
    let mut group = c.benchmark_group("windowing");

    for frame_count in [250usize, 2_500, 25_000].iter() {
        let frames: Vec<usize> = (0..*frame_count).filter(|f| f % 11 != 0).collect();
        group.bench_with_input(BenchmarkId::new("build_windows", frame_count), &frames, |b, frames| {
            b.iter(|| black_box(build_windows(black_box(frames), 24.0)))
        });
    }

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let aggregator = StatsAggregator::new(StatsConfig::default(), 24.0);

    for players in [6u32, 22].iter() {
        let tracks = create_mock_tracks(1_500, *players);
        let possession = PossessionRecord {
            assigned: vec![None; tracks.len()],
            team_control: (0..tracks.len()).map(|f| (f % 2 + 1) as u8).collect(),
        };
        group.bench_with_input(BenchmarkId::new("aggregate", players), &tracks, |b, tracks| {
            b.iter(|| black_box(aggregator.aggregate(black_box(tracks), &possession)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_windowing, benchmark_aggregation);
criterion_main!(benches);
