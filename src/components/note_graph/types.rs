use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Stable identity of a note, mirrored by its graph node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

impl NoteId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NoteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NoteId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

/// A note as owned by the surrounding application. Read-only here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub id: NoteId,
	pub title: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub folder: String,
}

impl Note {
	pub fn new(
		id: impl Into<String>,
		title: impl Into<String>,
		body: impl Into<String>,
		folder: impl Into<String>,
	) -> Self {
		Self {
			id: NoteId::new(id),
			title: title.into(),
			body: body.into(),
			folder: folder.into(),
		}
	}
}

/// Visual class of a node, derived from its note's folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Category {
	Inbox,
	Project,
	#[default]
	Other,
}

impl Category {
	/// Folder names are compared case-insensitively; unknown folders are `Other`.
	pub fn from_folder(folder: &str) -> Self {
		match folder.trim().to_lowercase().as_str() {
			"inbox" => Category::Inbox,
			"projects" => Category::Project,
			_ => Category::Other,
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			Category::Inbox => "#ff7f0e",
			Category::Project => "#2ca02c",
			Category::Other => "#1f77b4",
		}
	}
}

/// Structural node. Position and velocity live in the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: NoteId,
	pub label: String,
	pub category: Category,
	pub tags: Vec<String>,
}

/// "source's body references target's title".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphLink {
	pub source: NoteId,
	pub target: NoteId,
}

impl GraphLink {
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
	pub x: f64,
	pub y: f64,
}

impl Vec2 {
	pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	pub fn distance(self, other: Vec2) -> f64 {
		(self - other).length()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	pub fn lerp(self, to: Vec2, t: f64) -> Vec2 {
		self + (to - self) * t
	}
}

impl Add for Vec2 {
	type Output = Vec2;

	fn add(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vec2 {
	type Output = Vec2;

	fn sub(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Vec2;

	fn mul(self, rhs: f64) -> Vec2 {
		Vec2::new(self.x * rhs, self.y * rhs)
	}
}
