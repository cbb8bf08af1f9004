use super::game::{EngineContext, Game, GameConfig};
use crate::core::time::FixedTimestep;

/// Drives a [`Game`] at a fixed tick rate from variable frame times.
pub struct Runtime<G: Game> {
    game: G,
    ctx: EngineContext,
    timestep: FixedTimestep,
    config: GameConfig,
    initialized: bool,
}

impl<G: Game> Runtime<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::with_max_steps(config.fixed_dt, config.max_steps_per_frame);
        Self {
            game,
            ctx: EngineContext::new(&config),
            timestep,
            config,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        if self.initialized {
            log::warn!("runtime already initialized");
            return;
        }
        self.game.init(&mut self.ctx);
        self.initialized = true;
        log::info!("runtime initialized (dt = {}s)", self.config.fixed_dt);
    }

    /// Feed one frame's worth of wall time; runs as many whole ticks as it
    /// covers. Returns the number of ticks run.
    pub fn frame(&mut self, frame_dt: f32) -> u32 {
        if !self.initialized {
            return 0;
        }
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// Run exactly one tick.
    pub fn step(&mut self) {
        let dt = self.timestep.dt();
        self.ctx.begin_tick(dt);
        self.game.update(&mut self.ctx);
        self.ctx.simulate(dt);
        self.ctx.present();
        self.game.render(&self.ctx);
    }

    /// Interpolation alpha between the last tick and the next.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Tear the context down and hand the game back.
    pub fn shutdown(mut self) -> G {
        self.ctx.shutdown();
        self.game
    }
}
