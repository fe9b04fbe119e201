use gridworld_core::{Coordinate, Direction, GridConfig, TransitionTable};
use gridworld_environment::{EnvError, GridEnv, Observation};
use gridworld_system_rollout::{
    run_episode, ConstantPolicy, Outcome, Policy, RandomPolicy, RolloutStats,
};
use gridworld_world::{CellSpec, Grid};

fn deterministic_env(max_steps: u32) -> GridEnv {
    let mut grid = Grid::grid_4x3(0);
    grid.set_transition_table(TransitionTable::deterministic());
    GridEnv::with_max_steps(grid, max_steps)
}

#[test]
fn constant_right_along_top_row_reaches_goal() {
    let mut env = deterministic_env(100);
    let mut policy = ConstantPolicy::new(Direction::Right);
    let summary =
        run_episode(&mut env, &mut policy, Some(Coordinate::new(0, 2))).expect("episode runs");

    assert_eq!(summary.outcome, Outcome::Goal);
    assert_eq!(summary.steps, 3);
    assert_eq!(summary.final_reward, 1.0);
    assert!((summary.total_reward - 0.92).abs() < 1e-12);
}

#[test]
fn constant_right_into_fail_terminal() {
    let mut env = deterministic_env(100);
    let mut policy = ConstantPolicy::new(Direction::Right);
    let summary =
        run_episode(&mut env, &mut policy, Some(Coordinate::new(2, 1))).expect("episode runs");

    assert_eq!(summary.outcome, Outcome::Fail);
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.total_reward, -1.0);
}

#[test]
fn blocked_policy_is_truncated() {
    let mut env = deterministic_env(5);
    let mut policy = ConstantPolicy::new(Direction::Left);
    let summary =
        run_episode(&mut env, &mut policy, Some(Coordinate::new(0, 0))).expect("episode runs");

    assert_eq!(summary.outcome, Outcome::Truncated);
    assert_eq!(summary.steps, 6);
    assert!((summary.total_reward + 0.24).abs() < 1e-12);
}

#[test]
fn hand_built_terminals_are_classified_by_their_rewards() {
    let specs = [
        CellSpec::terminal(Coordinate::new(0, 0), -2.0),
        CellSpec::standard(Coordinate::new(1, 0), -0.1),
        CellSpec::standard(Coordinate::new(2, 0), -0.1),
        CellSpec::terminal(Coordinate::new(3, 0), 5.0),
    ];
    let mut grid = Grid::from_layout(1, 4, &specs, 0).expect("layout builds");
    grid.set_transition_table(TransitionTable::deterministic());
    let mut env = GridEnv::with_max_steps(grid, 10);

    let mut right = ConstantPolicy::new(Direction::Right);
    let goal = run_episode(&mut env, &mut right, Some(Coordinate::new(1, 0))).expect("episode runs");
    assert_eq!(goal.outcome, Outcome::Goal);
    assert_eq!(goal.steps, 2);
    assert_eq!(goal.final_reward, 5.0);

    let mut left = ConstantPolicy::new(Direction::Left);
    let fail = run_episode(&mut env, &mut left, Some(Coordinate::new(1, 0))).expect("episode runs");
    assert_eq!(fail.outcome, Outcome::Fail);
    assert_eq!(fail.steps, 1);

    let mut stats = RolloutStats::new();
    stats.record(&goal);
    stats.record(&fail);
    assert_eq!(stats.goals(), 1);
    assert_eq!(stats.fails(), 1);
    assert_eq!(stats.other_terminals(), 0);
}

struct OutOfRange;

impl Policy for OutOfRange {
    fn choose_action(&mut self, _observation: Observation) -> usize {
        9
    }
}

#[test]
fn invalid_policy_output_is_reported() {
    let mut env = deterministic_env(5);
    let result = run_episode(&mut env, &mut OutOfRange, None);
    assert_eq!(result, Err(EnvError::InvalidAction(9)));
}

#[test]
fn random_rollouts_replay_deterministically() {
    let replay = || {
        let config = GridConfig {
            rows: 4,
            columns: 5,
            seed: 0x0dd5,
            ..GridConfig::default()
        };
        let mut env = GridEnv::with_max_steps(Grid::random(&config).expect("grid builds"), 50);
        let mut policy: Box<dyn Policy> = Box::new(RandomPolicy::new(3));
        let mut stats = RolloutStats::new();
        let mut summaries = Vec::new();
        for _ in 0..40 {
            let summary = run_episode(&mut env, policy.as_mut(), None).expect("episode runs");
            stats.record(&summary);
            summaries.push(summary);
        }
        (stats, summaries)
    };

    let (first_stats, first) = replay();
    let (second_stats, second) = replay();
    assert_eq!(first, second);
    assert_eq!(first_stats, second_stats);
    assert_eq!(first_stats.episodes(), 40);
    assert_eq!(
        first_stats.goals()
            + first_stats.fails()
            + first_stats.other_terminals()
            + first_stats.truncated(),
        40
    );
    for summary in &first {
        assert!(summary.steps >= 1 && summary.steps <= 51);
    }
}
