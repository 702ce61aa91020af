//! Cards, shapes, and the stack every hand and deck is built on.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label printed on every wild card.
pub const WILD_CARD_LABEL: &str = "Wild Card";

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// The symbol printed on a card. Two visible cards with the same shape
/// start a faceoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Plus,
    Waves,
    Diamond,
    Asterisk,
    Dots,
    Equals,
    /// Only ever the shape of a wild card; never declared by one.
    Wild,
}

impl Shape {
    /// The eight shapes regular cards are printed with.
    pub const REGULAR: [Shape; 8] = [
        Shape::Circle,
        Shape::Square,
        Shape::Plus,
        Shape::Waves,
        Shape::Diamond,
        Shape::Asterisk,
        Shape::Dots,
        Shape::Equals,
    ];

    /// Returns `true` for every shape except [`Shape::Wild`].
    pub fn is_regular(self) -> bool {
        self != Shape::Wild
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Plus => "plus",
            Self::Waves => "waves",
            Self::Diamond => "diamond",
            Self::Asterisk => "asterisk",
            Self::Dots => "dots",
            Self::Equals => "equals",
            Self::Wild => "wild",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// Unique identifier of a physical card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub Uuid);

/// A single card. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub shape: Shape,
    pub category: String,
    pub is_wild: bool,
    /// The two shapes a wild card links. `None` on regular cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wild_shapes: Option<[Shape; 2]>,
}

impl Card {
    /// Creates a regular card.
    pub fn regular(shape: Shape, category: impl Into<String>) -> Self {
        Self {
            id: CardId(Uuid::new_v4()),
            shape,
            category: category.into(),
            is_wild: false,
            wild_shapes: None,
        }
    }

    /// Creates a wild card linking two shapes.
    pub fn wild(shapes: [Shape; 2]) -> Self {
        Self {
            id: CardId(Uuid::new_v4()),
            shape: Shape::Wild,
            category: WILD_CARD_LABEL.to_owned(),
            is_wild: true,
            wild_shapes: Some(shapes),
        }
    }

    /// The shape this card shows for matching. Wild cards show none.
    pub fn matching_shape(&self) -> Option<Shape> {
        if self.is_wild { None } else { Some(self.shape) }
    }

    /// Returns `true` if this is a wild card whose two shapes are exactly
    /// `a` and `b`, in either order.
    pub fn links(&self, a: Shape, b: Shape) -> bool {
        match self.wild_shapes {
            Some([x, y]) => (x == a && y == b) || (x == b && y == a),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// CardStack
// ---------------------------------------------------------------------------

/// A last-in-first-out pile of cards. Only the top is reachable.
///
/// Used for both personal stacks (top = the visible card) and the shared
/// deck (top = the draw end).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardStack(Vec<Card>);

impl CardStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Places a card on top.
    pub fn push(&mut self, card: Card) {
        self.0.push(card);
    }

    /// Removes and returns the top card.
    pub fn pop(&mut self) -> Option<Card> {
        self.0.pop()
    }

    /// Returns the top card without removing it.
    pub fn peek(&self) -> Option<&Card> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.0.iter()
    }
}

/// Collects bottom to top: the last item becomes the top.
impl FromIterator<Card> for CardStack {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
