/// Owner of the one live shader program.
///
/// There is no empty state: a slot is created with a program and a rebuild
/// only swaps once the replacement exists. The old program is dropped after
/// the swap.
#[derive(Debug)]
pub struct ProgramSlot<P> {
    current: P,
    generation: u64,
}

impl<P> ProgramSlot<P> {
    pub fn new(program: P) -> Self {
        Self {
            current: program,
            generation: 0,
        }
    }

    pub fn get(&self) -> &P {
        &self.current
    }

    pub fn get_mut(&mut self) -> &mut P {
        &mut self.current
    }

    /// Number of successful rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build a replacement and swap it in. If `build` fails the current
    /// program is left untouched and the error is returned.
    pub fn rebuild<E>(&mut self, build: impl FnOnce() -> Result<P, E>) -> Result<(), E> {
        let next = build()?;
        let previous = std::mem::replace(&mut self.current, next);
        self.generation += 1;
        drop(previous);
        Ok(())
    }

    pub fn into_inner(self) -> P {
        self.current
    }
}
