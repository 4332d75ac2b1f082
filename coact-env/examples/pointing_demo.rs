//! Example: goal-seeking user and constant-gain assistant solving pointing

use coact_core::prelude::*;
use coact_core::state::ResetDict;
use coact_agent::{constant_gain_assistant, goal_user};
use coact_env::SimplePointingTask;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let grid_size = 31;
    let task = SimplePointingTask::new(grid_size, 8)?;
    let user = goal_user((0..grid_size).collect::<Vec<_>>())?;
    let assistant = constant_gain_assistant(1)?;
    let mut bundle = Bundle::builder()
        .task(task)
        .user(user)
        .assistant(assistant)
        .build()?;

    // Run episodes
    let num_episodes: u64 = 10;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        // pin the goal to a fixed cell so every episode is comparable
        let dic = ResetDict::new()
            .with_nested("user_state", ResetDict::new().with("goal", 4i64));
        bundle.reset(Some(&dic), None, Some(episode))?;

        let mut total_reward = 0.0;
        let mut rounds = 0;

        loop {
            // both agents play their own policies
            let (_state, rewards, done) = bundle.step(None, None)?;
            total_reward += rewards.total();
            rounds += 1;

            if done || rounds >= 200 {
                break;
            }
        }

        episode_rewards.push(total_reward);
        println!(
            "Episode {}: Total Reward = {:.2}, Rounds = {}",
            episode + 1,
            total_reward,
            rounds
        );
    }

    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / episode_rewards.len() as f64;
    println!("\nAverage Reward over {num_episodes} episodes: {avg_reward:.2}");

    Ok(())
}
