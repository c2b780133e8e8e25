use std::collections::HashMap;
use tracing::{debug, warn};

use super::assets::ClipDescriptor;
use super::error::LookupError;
use crate::config::AnimationConfig;

/// One named clip of a character's animation set.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Natural clip bounds as imported
    pub from_frame: f32,
    pub to_frame: f32,
    pub frame_rate: f32,
    pub speed: f32,
    pub looped: bool,
    pub weight: f32,
    pub playing: bool,
    /// Playback cursor and the window currently being played
    pub frame: f32,
    window: (f32, f32),
}

impl AnimationClip {
    pub fn new(name: &str, from_frame: f32, to_frame: f32, frame_rate: f32) -> Self {
        Self {
            name: name.to_string(),
            from_frame,
            to_frame,
            frame_rate,
            speed: 1.0,
            looped: true,
            weight: 0.0,
            playing: false,
            frame: from_frame,
            window: (from_frame, to_frame),
        }
    }

    pub fn from_descriptor(descriptor: &ClipDescriptor, frame_rate: f32) -> Self {
        Self::new(&descriptor.name, descriptor.from_frame, descriptor.to_frame, frame_rate)
    }

    fn start(&mut self, options: &PlayOptions, looped: bool, weight: f32) {
        let from = options.from_frame.unwrap_or(self.from_frame);
        let to = options.to_frame.unwrap_or(self.to_frame).max(from);
        self.window = (from, to);
        self.frame = from;
        self.speed = options.speed.max(0.0);
        self.looped = looped;
        self.weight = weight;
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.weight = 0.0;
    }

    /// Advances the cursor. Returns true when a non-looping clip reached its end.
    fn advance(&mut self, dt: f32) -> bool {
        if !self.playing {
            return false;
        }
        let (from, to) = self.window;
        self.frame += dt * self.frame_rate * self.speed;
        if self.frame < to {
            return false;
        }
        let length = to - from;
        if self.looped && length > 0.0 {
            self.frame = from + (self.frame - from).rem_euclid(length);
            false
        } else {
            // Ended clips hold their last pose at the current weight.
            self.frame = to;
            self.playing = false;
            true
        }
    }
}

/// Parameters of a `play` request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    pub speed: f32,
    /// Defaults to the clip's first frame
    pub from_frame: Option<f32>,
    /// Defaults to the clip's natural end
    pub to_frame: Option<f32>,
    /// Ignored for one-shot clips, which never loop
    pub looped: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            from_frame: None,
            to_frame: None,
            looped: true,
        }
    }
}

impl PlayOptions {
    pub fn once() -> Self {
        Self {
            looped: false,
            ..Self::default()
        }
    }

    pub fn frames(mut self, from: f32, to: f32) -> Self {
        self.from_frame = Some(from);
        self.to_frame = Some(to);
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Linear crossfade between the previous and the incoming clip.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendTask {
    pub incoming: String,
    pub outgoing: Option<String>,
    pub elapsed: f32,
    pub duration: f32,
}

impl BlendTask {
    /// Incoming weight as a pure function of elapsed time.
    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnimationEvent {
    /// A non-looping clip played through its window
    Ended(String),
}

/// Crossfading clip player for one character.
///
/// Exactly one clip is current at any time. `play` starts a new current clip
/// and either crossfades into it over the configured blend window or, for
/// preempting one-shots, cuts to it. `tick` samples the running blend and
/// advances every playing clip by wall-clock time.
pub struct AnimationBlendEngine {
    settings: AnimationConfig,
    clips: HashMap<String, AnimationClip>,
    current: Option<String>,
    blend: Option<BlendTask>,
    jumping: bool,
}

impl AnimationBlendEngine {
    pub fn new(settings: AnimationConfig) -> Self {
        Self {
            settings,
            clips: HashMap::new(),
            current: None,
            blend: None,
            jumping: false,
        }
    }

    /// Stores the clip set and starts the idle clip looping at full weight.
    pub fn initialize(&mut self, clips: impl IntoIterator<Item = AnimationClip>) {
        self.clips = clips.into_iter().map(|clip| (clip.name.clone(), clip)).collect();
        self.blend = None;
        self.jumping = false;
        self.current = None;

        let idle = self.settings.idle_clip.clone();
        match self.clips.get_mut(&idle) {
            Some(clip) => {
                clip.start(&PlayOptions::default(), true, 1.0);
                self.current = Some(idle);
            }
            None => warn!(error = %LookupError::Clip(idle), "idle clip missing, character starts unposed"),
        }
        if !self.clips.contains_key(&self.settings.jump_clip) {
            debug!(clip = %self.settings.jump_clip, "no jump clip in set");
        }
    }

    /// Builds clips from loader descriptors at the configured frame rate.
    pub fn initialize_from(&mut self, descriptors: &[ClipDescriptor]) {
        let frame_rate = self.settings.frame_rate;
        self.initialize(
            descriptors
                .iter()
                .map(|d| AnimationClip::from_descriptor(d, frame_rate))
                .collect::<Vec<_>>(),
        );
    }

    /// Makes `name` the current clip. Returns false when nothing changed
    /// (already playing, or unknown clip).
    pub fn play(&mut self, name: &str, options: PlayOptions) -> bool {
        if !self.clips.contains_key(name) {
            warn!(error = %LookupError::Clip(name.to_string()), "missing clip, play request ignored");
            return false;
        }
        if self.current.as_deref() == Some(name) && self.is_playing(name) {
            return false;
        }

        // Cancel the in-flight blend; its outgoing clip would otherwise freeze mid-weight.
        if let Some(cancelled) = self.blend.take() {
            if let Some(outgoing) = cancelled.outgoing.filter(|o| o != name) {
                self.stop_clip(&outgoing);
            }
        }

        let previous = self.current.take().filter(|p| p != name);
        let looped = options.looped && !self.settings.is_one_shot(name);
        let preempt = self.settings.preempts(name);

        if preempt {
            if let Some(prev) = previous.as_deref() {
                self.stop_clip(prev);
            }
        }
        if let Some(clip) = self.clips.get_mut(name) {
            clip.start(&options, looped, if preempt { 1.0 } else { 0.0 });
        }
        if !preempt {
            if let Some(prev) = previous.as_deref().and_then(|p| self.clips.get_mut(p)) {
                prev.weight = 1.0;
            }
            self.blend = Some(BlendTask {
                incoming: name.to_string(),
                outgoing: previous.clone(),
                elapsed: 0.0,
                duration: self.settings.blend_duration_secs(),
            });
        }

        if name == self.settings.jump_clip {
            self.jumping = true;
        }
        debug!(from = ?previous, to = name, preempt, looped, "play clip");
        self.current = Some(name.to_string());

        // A zero-length window completes immediately.
        if self.blend.as_ref().is_some_and(BlendTask::is_complete) {
            self.step_blend(0.0);
        }
        true
    }

    /// Advances the blend and every playing clip by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Vec<AnimationEvent> {
        let dt = dt.max(0.0);
        self.step_blend(dt);

        let mut events = Vec::new();
        for clip in self.clips.values_mut() {
            if clip.advance(dt) {
                events.push(AnimationEvent::Ended(clip.name.clone()));
            }
        }
        events.sort();

        for AnimationEvent::Ended(name) in &events {
            if *name == self.settings.jump_clip {
                self.jumping = false;
            }
            debug!(clip = %name, "clip ended");
        }
        events
    }

    fn step_blend(&mut self, dt: f32) {
        let Some(blend) = self.blend.as_mut() else {
            return;
        };
        blend.elapsed = (blend.elapsed + dt).min(blend.duration.max(0.0));
        let alpha = blend.alpha();
        let complete = blend.is_complete();
        let incoming = blend.incoming.clone();
        let outgoing = blend.outgoing.clone();

        if let Some(clip) = self.clips.get_mut(&incoming) {
            clip.weight = alpha;
        }
        if let Some(clip) = outgoing.as_deref().and_then(|o| self.clips.get_mut(o)) {
            clip.weight = 1.0 - alpha;
        }

        if complete {
            self.blend = None;
            if let Some(outgoing) = outgoing.as_deref() {
                self.stop_clip(outgoing);
            }
            let still_playing = self.clips.get_mut(&incoming).map(|clip| {
                clip.weight = 1.0;
                clip.playing
            });
            if incoming == self.settings.jump_clip && still_playing == Some(true) {
                self.jumping = true;
            }
        }
    }

    /// Stops a superseded clip. A jump cut short never reports Ended, so the
    /// jump flag is cleared here.
    fn stop_clip(&mut self, name: &str) {
        if let Some(clip) = self.clips.get_mut(name) {
            clip.stop();
        }
        if name == self.settings.jump_clip {
            self.jumping = false;
        }
    }

    /// True iff the clip exists and is not playing. Unknown clips report false.
    pub fn has_ended(&self, name: &str) -> bool {
        self.clips.get(name).is_some_and(|clip| !clip.playing)
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.clips.get(name).is_some_and(|clip| clip.playing)
    }

    pub fn weight(&self, name: &str) -> Option<f32> {
        self.clips.get(name).map(|clip| clip.weight)
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn blend(&self) -> Option<&BlendTask> {
        self.blend.as_ref()
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn settings(&self) -> &AnimationConfig {
        &self.settings
    }

    /// Stops every clip and forgets the current one.
    pub fn dispose(&mut self) {
        self.blend = None;
        for clip in self.clips.values_mut() {
            clip.stop();
        }
        self.current = None;
        self.jumping = false;
    }
}
