use quadshade_common::{Resolution, ShellConfig};
use quadshade_input::{Action, EventSource, HeldKeys, InputEvent, KeyBindings};
use quadshade_render::uniforms;
use quadshade_render::{
    FlyCamera, FrameOutcome, FrameUniforms, RenderBackend, RenderError, ShaderError,
    ShaderSources,
};
use std::time::Instant;

use crate::clock::FrameClock;
use crate::slot::ProgramSlot;

/// Lifecycle of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a window and GPU backend.
    Initializing,
    /// Rendering frames.
    Running,
    /// Quit requested; GPU resources released.
    ShuttingDown,
}

/// Errors the shell cannot recover from.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("no usable shader program: {0}")]
    NoProgram(#[source] ShaderError),
    #[error("cannot initialize: application is already {0:?}")]
    AlreadyInitialized(Phase),
    #[error(transparent)]
    Render(#[from] RenderError),
}

struct Session<B: RenderBackend> {
    backend: B,
    program: ProgramSlot<B::Program>,
}

enum State<B: RenderBackend> {
    Initializing,
    Running(Session<B>),
    ShuttingDown,
}

/// The shell: camera, input, timing, backend, and the live shader program.
pub struct Application<B: RenderBackend> {
    config: ShellConfig,
    sources: ShaderSources,
    camera: FlyCamera,
    keys: HeldKeys,
    bindings: KeyBindings,
    clock: FrameClock,
    state: State<B>,
    last_uniforms: Option<FrameUniforms>,
}

impl<B: RenderBackend> Application<B> {
    pub fn new(config: ShellConfig) -> Self {
        let sources = ShaderSources::from(&config.shaders);
        let camera = FlyCamera::from_config(&config.camera, config.window.resolution());
        let clock = FrameClock::new();
        Self {
            config,
            sources,
            camera,
            keys: HeldKeys::new(),
            bindings: KeyBindings::default(),
            clock,
            state: State::Initializing,
            last_uniforms: None,
        }
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Initializing => Phase::Initializing,
            State::Running(_) => Phase::Running,
            State::ShuttingDown => Phase::ShuttingDown,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.state {
            State::Running(session) => Some(&session.backend),
            _ => None,
        }
    }

    pub fn program(&self) -> Option<&B::Program> {
        match &self.state {
            State::Running(session) => Some(session.program.get()),
            _ => None,
        }
    }

    /// Number of successful shader rebuilds since initialization.
    pub fn program_generation(&self) -> Option<u64> {
        match &self.state {
            State::Running(session) => Some(session.program.generation()),
            _ => None,
        }
    }

    /// Uniforms uploaded by the most recent frame.
    pub fn last_uniforms(&self) -> Option<&FrameUniforms> {
        self.last_uniforms.as_ref()
    }

    pub fn initialize(&mut self, backend: B) -> Result<(), ShellError> {
        self.initialize_at(backend, Instant::now())
    }

    /// Take ownership of the backend, build the first program and start the
    /// clock at `now`.
    ///
    /// If the configured shader cannot be built the backend's fallback
    /// program is used instead, so the user can fix the source and reload.
    pub fn initialize_at(&mut self, mut backend: B, now: Instant) -> Result<(), ShellError> {
        let phase = self.phase();
        if phase != Phase::Initializing {
            return Err(ShellError::AlreadyInitialized(phase));
        }

        let program = match backend.build_program(&self.sources) {
            Ok(program) => {
                tracing::info!(
                    vertex = %self.sources.vertex.display(),
                    fragment = %self.sources.fragment.display(),
                    "shader program built"
                );
                program
            }
            Err(e) => {
                tracing::error!("{e}");
                tracing::warn!("using fallback shader; fix the source and press 0 to reload");
                backend.fallback_program().map_err(ShellError::NoProgram)?
            }
        };
        report_contract_coverage(&program);

        self.camera.set_viewport(backend.size());
        self.clock = FrameClock::starting_at(now);
        self.state = State::Running(Session {
            backend,
            program: ProgramSlot::new(program),
        });
        tracing::info!("shell running");
        Ok(())
    }

    pub fn frame(&mut self, events: &mut impl EventSource) -> Result<Phase, ShellError> {
        self.frame_at(events, Instant::now())
    }

    /// Run one frame at `now`: drain input, update the camera, upload the
    /// uniform contract and draw.
    pub fn frame_at(
        &mut self,
        events: &mut impl EventSource,
        now: Instant,
    ) -> Result<Phase, ShellError> {
        if self.phase() != Phase::Running {
            return Ok(self.phase());
        }

        let time = self.clock.tick_at(now);

        while let Some(event) = events.next_event() {
            self.handle_event(event);
            if self.phase() != Phase::Running {
                return Ok(self.phase());
            }
        }

        let State::Running(session) = &mut self.state else {
            return Ok(self.phase());
        };

        let size = session.backend.size();
        let motion_dt = match self.config.max_frame_delta {
            Some(cap) => time.dt.min(cap),
            None => time.dt,
        };
        self.camera.update(self.bindings.movement(&self.keys), motion_dt);

        let frame_uniforms = FrameUniforms::new(size, time.elapsed, time.dt, &self.camera);
        let program = session.program.get_mut();
        frame_uniforms.apply(program);
        self.last_uniforms = Some(frame_uniforms);

        if session.backend.draw_frame(program, self.config.clear_color)? == FrameOutcome::Skipped
        {
            tracing::trace!(frame = time.frame_index, "frame skipped");
        }
        Ok(Phase::Running)
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, state } => {
                let pressed = self.keys.apply(key, state);
                if !pressed {
                    return;
                }
                if let Some(action) = self.bindings.action(key) {
                    if action.is_discrete() {
                        self.dispatch(action);
                    }
                }
            }
            InputEvent::PointerMoved { x, y } => self.camera.mouse_moved(x, y),
            InputEvent::Resized { width, height } => {
                let size = Resolution::new(width, height);
                if let State::Running(session) = &mut self.state {
                    session.backend.resize(size);
                }
                self.camera.set_viewport(size);
            }
            InputEvent::FocusLost => {
                self.keys.clear();
                self.camera.reset_mouse();
            }
            InputEvent::CloseRequested => self.shutdown(),
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.shutdown(),
            Action::RebuildShader => {
                // failures are already logged; the previous program stays live
                let _ = self.rebuild_shader();
            }
            _ => {}
        }
    }

    /// Rebuild the program from the configured source files. On failure the
    /// previous program stays in use.
    pub fn rebuild_shader(&mut self) -> Result<(), ShaderError> {
        let State::Running(session) = &mut self.state else {
            return Ok(());
        };
        tracing::info!("rebuilding shader program");

        let sources = &self.sources;
        let backend = &mut session.backend;
        match session.program.rebuild(|| backend.build_program(sources)) {
            Ok(()) => {
                tracing::info!(
                    generation = session.program.generation(),
                    "shader program rebuilt"
                );
                report_contract_coverage(session.program.get());
                Ok(())
            }
            Err(e) => {
                tracing::error!("shader rebuild failed, keeping previous program: {e}");
                Err(e)
            }
        }
    }

    /// Release the backend and program. Idempotent.
    pub fn shutdown(&mut self) {
        if matches!(self.state, State::ShuttingDown) {
            return;
        }
        self.state = State::ShuttingDown;
        self.keys.clear();
        tracing::info!("shutting down");
    }
}

fn report_contract_coverage(program: &impl quadshade_render::ShaderProgram) {
    let missing = uniforms::missing_from(program);
    if !missing.is_empty() {
        tracing::debug!(?missing, "program does not use every contract uniform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use quadshade_input::{EventQueue, Key};
    use quadshade_render::uniforms::{CONTRACT, names};
    use quadshade_render::{QUAD_INDEX_COUNT, ShaderProgram, UniformKind, UniformValue};
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug)]
    struct FakeProgram {
        id: u32,
        fallback: bool,
        values: HashMap<String, UniformValue>,
    }

    impl ShaderProgram for FakeProgram {
        fn uniform_kind(&self, name: &str) -> Option<UniformKind> {
            CONTRACT
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, kind)| *kind)
        }

        fn set_uniform(&mut self, name: &str, value: UniformValue) {
            if self.uniform_kind(name) == Some(value.kind()) {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    impl FakeProgram {
        fn vec2(&self, name: &str) -> Vec2 {
            match self.values.get(name) {
                Some(UniformValue::Vec2(v)) => *v,
                other => panic!("{name}: {other:?}"),
            }
        }

        fn vec3(&self, name: &str) -> Vec3 {
            match self.values.get(name) {
                Some(UniformValue::Vec3(v)) => *v,
                other => panic!("{name}: {other:?}"),
            }
        }

        fn float(&self, name: &str) -> f32 {
            match self.values.get(name) {
                Some(UniformValue::Float(v)) => *v,
                other => panic!("{name}: {other:?}"),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Draw {
        program_id: u32,
        index_count: u32,
        resolution: Vec2,
    }

    #[derive(Default)]
    struct FakeBackend {
        size: Resolution,
        built: u32,
        fail_build: bool,
        fail_fallback: bool,
        resizes: Vec<Resolution>,
        draws: Vec<Draw>,
    }

    impl RenderBackend for FakeBackend {
        type Program = FakeProgram;

        fn build_program(&mut self, sources: &ShaderSources) -> Result<FakeProgram, ShaderError> {
            if self.fail_build {
                return Err(ShaderError::Compile {
                    stage: quadshade_render::ShaderStage::Fragment,
                    path: sources.fragment.clone(),
                    message: "unexpected token".into(),
                });
            }
            self.built += 1;
            Ok(FakeProgram {
                id: self.built,
                fallback: false,
                values: HashMap::new(),
            })
        }

        fn fallback_program(&mut self) -> Result<FakeProgram, ShaderError> {
            if self.fail_fallback {
                return Err(ShaderError::Link {
                    message: "no device".into(),
                });
            }
            Ok(FakeProgram {
                id: 0,
                fallback: true,
                values: HashMap::new(),
            })
        }

        fn resize(&mut self, size: Resolution) {
            self.size = size;
            self.resizes.push(size);
        }

        fn size(&self) -> Resolution {
            self.size
        }

        fn draw_frame(
            &mut self,
            program: &mut FakeProgram,
            _clear_color: [f32; 4],
        ) -> Result<FrameOutcome, RenderError> {
            let resolution = program.vec2(names::RESOLUTION);
            self.draws.push(Draw {
                program_id: program.id,
                index_count: QUAD_INDEX_COUNT,
                resolution,
            });
            Ok(FrameOutcome::Presented)
        }
    }

    fn backend() -> FakeBackend {
        FakeBackend {
            size: Resolution::new(800, 600),
            ..FakeBackend::default()
        }
    }

    fn running() -> (Application<FakeBackend>, Instant) {
        let mut app = Application::new(ShellConfig::default());
        let t0 = Instant::now();
        app.initialize_at(backend(), t0).unwrap();
        (app, t0)
    }

    fn at(t0: Instant, secs: f32) -> Instant {
        t0 + Duration::from_secs_f32(secs)
    }

    fn press(key: Key) -> InputEvent {
        InputEvent::key_pressed(key)
    }

    fn release(key: Key) -> InputEvent {
        InputEvent::key_released(key)
    }

    #[test]
    fn starts_initializing_and_ignores_frames() {
        let mut app = Application::<FakeBackend>::new(ShellConfig::default());
        assert_eq!(app.phase(), Phase::Initializing);
        let mut events = EventQueue::new();
        events.push(press(Key::Escape));
        assert_eq!(app.frame(&mut events).unwrap(), Phase::Initializing);
        assert!(app.program().is_none());
        // events are left for whoever initializes the shell
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn initialize_builds_program() {
        let (app, _) = running();
        assert_eq!(app.phase(), Phase::Running);
        let program = app.program().unwrap();
        assert_eq!(program.id, 1);
        assert!(!program.fallback);
        assert_eq!(app.program_generation(), Some(0));
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let (mut app, _) = running();
        let err = app.initialize(backend()).unwrap_err();
        assert!(matches!(err, ShellError::AlreadyInitialized(Phase::Running)));
    }

    #[test]
    fn broken_shader_at_startup_uses_fallback() {
        let mut app = Application::new(ShellConfig::default());
        app.initialize(FakeBackend {
            fail_build: true,
            ..backend()
        })
        .unwrap();
        assert_eq!(app.phase(), Phase::Running);
        assert!(app.program().unwrap().fallback);

        let mut events = EventQueue::new();
        app.frame(&mut events).unwrap();
        assert_eq!(app.backend().unwrap().draws.len(), 1);
    }

    #[test]
    fn no_program_at_all_is_fatal() {
        let mut app = Application::new(ShellConfig::default());
        let err = app
            .initialize(FakeBackend {
                fail_build: true,
                fail_fallback: true,
                ..backend()
            })
            .unwrap_err();
        assert!(matches!(err, ShellError::NoProgram(_)));
        assert_eq!(app.phase(), Phase::Initializing);
    }

    #[test]
    fn every_frame_draws_the_quad_once() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        for i in 1..=5 {
            app.frame_at(&mut events, at(t0, i as f32 / 60.0)).unwrap();
        }
        let draws = &app.backend().unwrap().draws;
        assert_eq!(draws.len(), 5);
        assert!(draws.iter().all(|d| d.index_count == 6 && d.program_id == 1));
    }

    #[test]
    fn full_contract_uploaded_each_frame() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        app.frame_at(&mut events, at(t0, 0.5)).unwrap();
        app.frame_at(&mut events, at(t0, 0.75)).unwrap();

        let program = app.program().unwrap();
        for (name, _) in CONTRACT {
            assert!(program.values.contains_key(name), "{name} not uploaded");
        }
        assert!((program.float(names::TIME) - 0.75).abs() < 1e-5);
        assert!((program.float(names::DELTA_TIME) - 0.25).abs() < 1e-5);
        assert_eq!(program.vec3(names::CAMERA_ORIGIN), app.camera().position());
        assert_eq!(program.vec3(names::CAMERA_DIRECTION), app.camera().front());
        assert_eq!(program.vec3(names::CAMERA_UP), app.camera().up());
        assert_eq!(app.last_uniforms().unwrap().time, program.float(names::TIME));
    }

    #[test]
    fn resize_reaches_next_frame_resolution() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        app.frame_at(&mut events, at(t0, 0.01)).unwrap();

        events.push(InputEvent::Resized {
            width: 1366,
            height: 701,
        });
        app.frame_at(&mut events, at(t0, 0.02)).unwrap();

        let backend = app.backend().unwrap();
        assert_eq!(backend.resizes, vec![Resolution::new(1366, 701)]);
        assert_eq!(backend.draws[0].resolution, Vec2::new(800.0, 600.0));
        assert_eq!(backend.draws[1].resolution, Vec2::new(1366.0, 701.0));
        assert!((app.camera().aspect - 1366.0 / 701.0).abs() < 1e-5);
    }

    #[test]
    fn rebuild_key_swaps_program() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        events.push(press(Key::Digit0));
        events.push(release(Key::Digit0));
        app.frame_at(&mut events, at(t0, 0.01)).unwrap();

        assert_eq!(app.program().unwrap().id, 2);
        assert_eq!(app.program_generation(), Some(1));
        assert_eq!(app.backend().unwrap().draws[0].program_id, 2);
    }

    #[test]
    fn failed_rebuild_keeps_previous_program() {
        let mut app = Application::new(ShellConfig::default());
        let t0 = Instant::now();
        app.initialize_at(backend(), t0).unwrap();

        // break the source after startup
        if let State::Running(session) = &mut app.state {
            session.backend.fail_build = true;
        }
        let mut events = EventQueue::new();
        events.push(press(Key::Digit0));
        app.frame_at(&mut events, at(t0, 0.01)).unwrap();

        assert_eq!(app.phase(), Phase::Running);
        assert_eq!(app.program().unwrap().id, 1);
        assert_eq!(app.program_generation(), Some(0));
        assert_eq!(app.backend().unwrap().draws.len(), 1);
        assert!(app.rebuild_shader().is_err());
        assert_eq!(app.program().unwrap().id, 1);
    }

    #[test]
    fn held_rebuild_key_rebuilds_once() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        // OS key repeat
        events.extend([press(Key::Digit0), press(Key::Digit0), press(Key::Digit0)]);
        app.frame_at(&mut events, at(t0, 0.01)).unwrap();
        events.push(press(Key::Digit0));
        app.frame_at(&mut events, at(t0, 0.02)).unwrap();
        assert_eq!(app.program_generation(), Some(1));
    }

    #[test]
    fn escape_shuts_down_without_drawing() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        events.push(press(Key::Escape));
        events.push(press(Key::Digit0));
        let phase = app.frame_at(&mut events, at(t0, 0.01)).unwrap();

        assert_eq!(phase, Phase::ShuttingDown);
        assert!(app.backend().is_none());
        assert!(app.program().is_none());
        // later events are not processed and later frames do nothing
        assert_eq!(app.frame_at(&mut events, at(t0, 0.02)).unwrap(), Phase::ShuttingDown);
    }

    #[test]
    fn close_request_shuts_down() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        events.push(InputEvent::CloseRequested);
        assert_eq!(
            app.frame_at(&mut events, at(t0, 0.01)).unwrap(),
            Phase::ShuttingDown
        );
        app.shutdown();
        assert_eq!(app.phase(), Phase::ShuttingDown);
    }

    #[test]
    fn held_key_moves_camera_by_speed_times_dt() {
        let (mut app, t0) = running();
        let start = app.camera().position();
        let speed = app.camera().speed;
        let mut events = EventQueue::new();
        events.push(press(Key::KeyW));
        app.frame_at(&mut events, at(t0, 0.1)).unwrap();
        app.frame_at(&mut events, at(t0, 0.2)).unwrap();
        app.frame_at(&mut events, at(t0, 0.25)).unwrap();

        let moved = (app.camera().position() - start).length();
        assert!((moved - speed * 0.25).abs() < 1e-4, "moved {moved}");

        events.push(release(Key::KeyW));
        let before = app.camera().position();
        app.frame_at(&mut events, at(t0, 0.5)).unwrap();
        assert_eq!(app.camera().position(), before);
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        events.push(press(Key::KeyD));
        events.push(InputEvent::FocusLost);
        let start = app.camera().position();
        app.frame_at(&mut events, at(t0, 0.1)).unwrap();
        assert_eq!(app.camera().position(), start);
    }

    #[test]
    fn first_pointer_event_does_not_turn() {
        let (mut app, t0) = running();
        let front = app.camera().front();
        let mut events = EventQueue::new();
        events.push(InputEvent::PointerMoved { x: 4000.0, y: -250.0 });
        app.frame_at(&mut events, at(t0, 0.01)).unwrap();
        assert_eq!(app.camera().front(), front);

        events.push(InputEvent::PointerMoved { x: 4100.0, y: -250.0 });
        app.frame_at(&mut events, at(t0, 0.02)).unwrap();
        assert_ne!(app.camera().front(), front);
        assert_eq!(
            app.program().unwrap().vec3(names::CAMERA_DIRECTION),
            app.camera().front()
        );
    }

    #[test]
    fn stalled_frame_uploads_real_delta() {
        let (mut app, t0) = running();
        let mut events = EventQueue::new();
        app.frame_at(&mut events, at(t0, 0.5)).unwrap();
        app.frame_at(&mut events, at(t0, 10.5)).unwrap();
        let u = app.last_uniforms().unwrap();
        assert!((u.delta_time - 10.0).abs() < 1e-3);
        assert!((u.time - 10.5).abs() < 1e-3);
        let program = app.program().unwrap();
        assert!((program.float(names::DELTA_TIME) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn motion_cap_leaves_delta_uniform_alone() {
        let config = ShellConfig {
            max_frame_delta: Some(0.25),
            ..ShellConfig::default()
        };
        let mut app = Application::new(config);
        let t0 = Instant::now();
        app.initialize_at(backend(), t0).unwrap();
        let start = app.camera().position();
        let speed = app.camera().speed;

        let mut events = EventQueue::new();
        events.push(press(Key::KeyW));
        app.frame_at(&mut events, at(t0, 2.0)).unwrap();

        let moved = (app.camera().position() - start).length();
        assert!((moved - speed * 0.25).abs() < 1e-4, "moved {moved}");
        assert!((app.last_uniforms().unwrap().delta_time - 2.0).abs() < 1e-3);
    }
}
