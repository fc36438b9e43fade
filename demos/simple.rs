use grid_replanning::{Algorithm, GridMap, Point};

// In this example an agent crosses a 5x5 grid with shape
//  _____
// |S.#..|
// |..#..|
// |..#..|
// |.....|
// |....G|
//  _____
// where
// - # marks an obstacle the agent does not know about in advance
// - S marks the start
// - G marks the goal
//
// Nodes have a 4-neighborhood

fn main() -> Result<(), grid_replanning::ReplanError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut world = GridMap::new(5)?;
    for x in 0..3 {
        world.set(Point::new(x, 2), true);
    }
    println!("{}", world);

    let start = Point::new(0, 0);
    let goal = Point::new(4, 4);
    for algorithm in Algorithm::ALL {
        let nav = algorithm.replanner().navigate(&world, start, goal)?;
        println!(
            "{algorithm}: {:?} after {} moves, {} searches, {} expansions",
            nav.outcome,
            nav.moves(),
            nav.stats.searches,
            nav.stats.expanded
        );
        println!("{}", world.render_trace(&nav.trace));
    }
    Ok(())
}
