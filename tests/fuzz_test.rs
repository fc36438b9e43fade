/// Fuzzes the controllers by checking on many random grids that the goal is reached exactly when
/// it lies in the same connected component as the start, and that every trace is a valid walk.
use grid_replanning::{
    solver::{search, Manhattan},
    trace_is_valid, Algorithm, GridMap, KnownGrid, Point, NEUMANN_OFFSETS,
};
use rand::prelude::*;
use std::collections::VecDeque;

fn random_grid(n: usize, rng: &mut StdRng, start: Point, goal: Point) -> GridMap {
    let mut rows = (0..n)
        .map(|_| (0..n).map(|_| rng.gen_bool(0.3)).collect::<Vec<bool>>())
        .collect::<Vec<_>>();
    for p in [start, goal] {
        rows[p.x as usize][p.y as usize] = false;
    }
    GridMap::from_rows(rows).unwrap()
}

/// Breadth-first distance on the fully known world.
fn bfs_distance(world: &GridMap, start: Point, goal: Point) -> Option<usize> {
    let n = world.size();
    let mut dist = vec![usize::MAX; n * n];
    let mut queue = VecDeque::from([start]);
    dist[world.get_ix_point(&start)] = 0;
    while let Some(p) = queue.pop_front() {
        let d = dist[world.get_ix_point(&p)];
        if p == goal {
            return Some(d);
        }
        for (dx, dy) in NEUMANN_OFFSETS {
            let q = Point::new(p.x + dx, p.y + dy);
            if world.can_move_to(q) && dist[world.get_ix_point(&q)] == usize::MAX {
                dist[world.get_ix_point(&q)] = d + 1;
                queue.push_back(q);
            }
        }
    }
    None
}

fn visualize_grid(world: &GridMap, trace: &[Point]) {
    println!("{}", world.render_trace(trace));
}

#[test]
fn fuzz() {
    const N: usize = 10;
    const N_GRIDS: usize = 2000;
    let mut rng = StdRng::seed_from_u64(0);
    let start = Point::new(0, 0);
    let goal = Point::new(N as i32 - 1, N as i32 - 1);
    let replanners = Algorithm::ALL.map(Algorithm::replanner);

    for _ in 0..N_GRIDS {
        let world = random_grid(N, &mut rng, start, goal);
        let reachable = world.reachable(&start, &goal);
        for replanner in &replanners {
            let nav = replanner.navigate(&world, start, goal).unwrap();
            // Show the grid if the outcome is wrong
            if nav.success() != reachable {
                println!("{} disagrees with reachability {reachable}", replanner.name());
                visualize_grid(&world, &nav.trace);
            }
            assert_eq!(nav.success(), reachable);
            assert!(trace_is_valid(&nav.trace, &world));
            assert_eq!(nav.trace.first(), Some(&start));
            assert_eq!(nav.trace.last() == Some(&goal), reachable);
            assert!(nav.known.obstacles().iter().all(|p| world.is_blocked(p)));
        }
    }
}

#[test]
fn fuzz_distance() {
    const N: usize = 6;
    const N_GRIDS: usize = 2000;
    let mut rng = StdRng::seed_from_u64(1);
    let start = Point::new(0, 0);
    let goal = Point::new(N as i32 - 1, N as i32 - 1);

    for _ in 0..N_GRIDS {
        let world = random_grid(N, &mut rng, start, goal);
        let mut known = KnownGrid::new(N);
        for (x, row) in world.rows().into_iter().enumerate() {
            for (y, blocked) in row.into_iter().enumerate() {
                if blocked {
                    known.mark_blocked(Point::new(x as i32, y as i32));
                }
            }
        }
        let expected = bfs_distance(&world, start, goal);
        let found = search(&known, start, goal, &Manhattan).ok().map(|plan| {
            assert_eq!(plan.path.len(), plan.cost + 1);
            plan.cost
        });
        if found != expected {
            visualize_grid(&world, &[]);
        }
        assert_eq!(found, expected);
    }
}

#[test]
fn runs_are_deterministic() {
    const N: usize = 12;
    let mut rng = StdRng::seed_from_u64(7);
    let start = Point::new(0, 0);
    let goal = Point::new(N as i32 - 1, N as i32 - 1);
    for _ in 0..50 {
        let world = random_grid(N, &mut rng, start, goal);
        for algorithm in Algorithm::ALL {
            let first = algorithm.replanner().navigate(&world, start, goal).unwrap();
            let second = algorithm.replanner().navigate(&world, start, goal).unwrap();
            assert_eq!(first.trace, second.trace);
            assert_eq!(first.stats, second.stats);
        }
    }
}
