// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The graphics state and the save/restore stack.

use crate::{
    new_error, Antialias, ClipStack, Error, ErrorKind, FillRule, FontState, Matrix, Operator,
    Options, Pattern, StrokeStyle,
};

/// The saved and restored bundle of drawing parameters.
///
/// Cloning is shallow for the source pattern, clip entries and font face,
/// and deep for everything else, including the dash array.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphicsState {
    pub source: Pattern,
    /// The user-to-device matrix in force when `source` was set.
    pub source_matrix: Matrix,
    pub operator: Operator,
    pub fill_rule: FillRule,
    pub antialias: Antialias,
    pub tolerance: f64,
    pub stroke: StrokeStyle,
    /// The current user-to-device transform.
    pub matrix: Matrix,
    pub font: FontState,
    pub clip: ClipStack,
}

impl GraphicsState {
    pub fn new(options: &Options) -> GraphicsState {
        let mut stroke = StrokeStyle::new()
            .width(options.line_width)
            .miter_limit(options.miter_limit)
            .line_cap(options.line_cap);
        stroke.set_line_join(options.line_join);
        GraphicsState {
            source: Pattern::default(),
            source_matrix: Matrix::IDENTITY,
            operator: options.operator,
            fill_rule: options.fill_rule,
            antialias: options.antialias,
            tolerance: options.tolerance,
            stroke,
            matrix: Matrix::IDENTITY,
            font: FontState::new(options.font_size),
            clip: ClipStack::new(),
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState::new(&Options::default())
    }
}

/// A stack of graphics states with a root that is never popped.
#[derive(Clone, Debug)]
pub struct StateStack {
    states: Vec<GraphicsState>,
}

impl StateStack {
    pub fn new(root: GraphicsState) -> StateStack {
        StateStack { states: vec![root] }
    }

    pub fn top(&self) -> &GraphicsState {
        // The root is never removed, so the stack is never empty.
        &self.states[self.states.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut GraphicsState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// Push a copy of the top state.
    pub fn push(&mut self) {
        let copy = self.top().clone();
        self.states.push(copy);
    }

    /// Pop the top state; fails at the root.
    pub fn pop(&mut self) -> Result<(), Error> {
        if self.states.len() <= 1 {
            return Err(new_error(ErrorKind::InvalidRestore));
        }
        self.states.pop();
        Ok(())
    }

    /// The number of saved states above the root.
    pub fn depth(&self) -> usize {
        self.states.len() - 1
    }
}
