use hitstop::Runtime;

mod game;
use game::Duel;

const FRAME_DT: f32 = 1.0 / 60.0;
const TIME_LIMIT: f32 = 30.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut runtime = Runtime::new(Duel::new());
    runtime.init();

    let mut elapsed = 0.0;
    while elapsed < TIME_LIMIT && !runtime.game().is_decided(runtime.context()) {
        runtime.frame(FRAME_DT);
        elapsed += FRAME_DT;
    }

    match runtime.game().standings(runtime.context()).as_slice() {
        [(name, health)] => log::info!("{name} wins with {health} HP after {elapsed:.2}s"),
        standings => log::info!("no winner after {elapsed:.2}s: {standings:?}"),
    }
    runtime.shutdown();
}
