// Headless arena the controllers play in
//
// The arena owns all mutable game state: tiles, bonuses, armed bombs, live
// explosions and characters. Controllers only ever see it through
// `WorldQuery`; the match runner feeds their intents back with
// `apply_intent` and advances time with `tick`.
//
// Once the round clock runs out the arena enters sudden death: cells turn
// into walls one by one along an inward spiral, crushing anyone inside.
//
// Characters move in pixels inside lanes: the coordinate perpendicular to the
// movement axis snaps to the centre of the current cell, so a character only
// ever has to check the single cell in front of it for collisions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;

use crate::config::GameRulesConfig;
use crate::types::{
    AgentId, AgentIntent, AgentState, BonusKind, Bomb, Direction, Entity, GridCoordinates, TileKind,
};
use crate::world::WorldQuery;

const MIN_SPEED: f64 = 1.0;
const SPEED_STEP: f64 = 0.5;

/// A character body living in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: AgentId,
    pub x: f64,
    pub y: f64,
    pub max_speed: f64,
    pub bomb_max: u32,
    pub range: u32,
    pub heading: Option<Direction>,
    pub alive: bool,
}

pub struct Arena {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
    bonuses: HashMap<GridCoordinates, BonusKind>,
    bombs: Vec<Bomb>,
    explosions: HashMap<GridCoordinates, u32>,
    characters: Vec<Character>,
    rules: GameRulesConfig,
    time_remaining: i64,
    ticks: u64,
    bombs_placed: u64,
    /// Sudden-death collapse order and how far along it we are
    collapse_order: Vec<GridCoordinates>,
    collapsed: usize,
    rng: StdRng,
}

impl Arena {
    /// Creates an empty, wall-less arena
    pub fn new(width: i32, height: i32, rules: GameRulesConfig, seed: u64) -> Self {
        let cells = (width.max(0) * height.max(0)) as usize;
        Arena {
            width,
            height,
            tiles: vec![TileKind::Empty; cells],
            bonuses: HashMap::new(),
            bombs: Vec::new(),
            explosions: HashMap::new(),
            characters: Vec::new(),
            time_remaining: rules.round_ticks(),
            rules,
            ticks: 0,
            bombs_placed: 0,
            collapse_order: spiral_order(width, height),
            collapsed: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds the classic layout: border walls, pillars on even cells and
    /// breakables scattered with `density`, leaving the four spawn corners open
    pub fn classic(width: i32, height: i32, density: f64, rules: GameRulesConfig, seed: u64) -> Self {
        let mut arena = Arena::new(width, height, rules, seed);
        let spawns = arena.spawn_points();

        for row in 0..height {
            for col in 0..width {
                let cell = GridCoordinates::new(col, row);
                let border = col == 0 || row == 0 || col == width - 1 || row == height - 1;
                let kind = if border || (col % 2 == 0 && row % 2 == 0) {
                    TileKind::Unbreakable
                } else if spawns.iter().any(|s| GridCoordinates::manhattan(*s, cell) <= 1) {
                    TileKind::Empty
                } else if arena.rng.random::<f64>() < density {
                    TileKind::Breakable
                } else {
                    TileKind::Empty
                };
                arena.set_tile(cell, kind);
            }
        }

        arena
    }

    /// Parses an ASCII layout, one string per row
    ///
    /// `#` unbreakable, `+` breakable, `.` empty, `g` good bonus, `b` bad bonus
    pub fn from_rows(rows: &[&str], rules: GameRulesConfig) -> Result<Self, String> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        if width == 0 || height == 0 {
            return Err("Arena layout must not be empty".to_string());
        }

        let mut arena = Arena::new(width, height, rules, 0);
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() as i32 != width {
                return Err(format!(
                    "Row {} has {} cells, expected {}",
                    row,
                    line.chars().count(),
                    width
                ));
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = GridCoordinates::new(col as i32, row as i32);
                match ch {
                    '#' => arena.set_tile(cell, TileKind::Unbreakable),
                    '+' => arena.set_tile(cell, TileKind::Breakable),
                    '.' => arena.set_tile(cell, TileKind::Empty),
                    'g' => arena.set_bonus(cell, BonusKind::RangeUp),
                    'b' => arena.set_bonus(cell, BonusKind::SpeedDown),
                    other => {
                        return Err(format!("Unknown tile '{}' at ({}, {})", other, col, row));
                    }
                }
            }
        }

        Ok(arena)
    }

    /// Number of columns
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Rules this arena was built with
    pub fn rules(&self) -> &GameRulesConfig {
        &self.rules
    }

    /// Ticks elapsed since the arena was created
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Bombs placed by characters so far
    pub fn bombs_placed(&self) -> u64 {
        self.bombs_placed
    }

    /// Overrides the round clock, e.g. to start sudden death early
    pub fn set_time_remaining(&mut self, ticks: i64) {
        self.time_remaining = ticks;
    }

    /// Corner cells characters start on
    pub fn spawn_points(&self) -> Vec<GridCoordinates> {
        vec![
            GridCoordinates::new(1, 1),
            GridCoordinates::new(self.width - 2, self.height - 2),
            GridCoordinates::new(self.width - 2, 1),
            GridCoordinates::new(1, self.height - 2),
        ]
    }

    fn index(&self, cell: GridCoordinates) -> Option<usize> {
        if self.is_inside_map(cell) {
            Some((cell.row * self.width + cell.col) as usize)
        } else {
            None
        }
    }

    /// Overwrites a tile, dropping any bonus it held unless `kind` is a bonus
    pub fn set_tile(&mut self, cell: GridCoordinates, kind: TileKind) {
        if let Some(idx) = self.index(cell) {
            self.tiles[idx] = kind;
            if kind != TileKind::Bonus {
                self.bonuses.remove(&cell);
            }
        }
    }

    /// Turns `cell` into a bonus tile holding `bonus`
    pub fn set_bonus(&mut self, cell: GridCoordinates, bonus: BonusKind) {
        if let Some(idx) = self.index(cell) {
            self.tiles[idx] = TileKind::Bonus;
            self.bonuses.insert(cell, bonus);
        }
    }

    /// Marks a cell as exploding for `ticks` ticks
    pub fn ignite(&mut self, cell: GridCoordinates, ticks: u32) {
        if ticks == 0 || !self.is_inside_map(cell) {
            return;
        }
        let entry = self.explosions.entry(cell).or_insert(0);
        *entry = (*entry).max(ticks);
    }

    /// Arms a bomb on an empty walkable cell; returns false if the cell is taken
    pub fn place_bomb(
        &mut self,
        cell: GridCoordinates,
        range: u32,
        fuse: u32,
        owner: Option<AgentId>,
    ) -> bool {
        if self.is_collidable(cell) || self.has_bomb(cell) {
            return false;
        }
        self.bombs.push(Bomb {
            position: cell,
            range,
            time_remaining: fuse,
            owner,
        });
        if owner.is_some() {
            self.bombs_placed += 1;
        }
        true
    }

    /// Armed bombs, in placement order
    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    /// Adds a character centred on `cell` with the starting loadout
    pub fn spawn_character(&mut self, cell: GridCoordinates) -> AgentId {
        let id = self.characters.len();
        let (x, y) = self.cell_center(cell);
        self.characters.push(Character {
            id,
            x,
            y,
            max_speed: self.rules.character_speed,
            bomb_max: self.rules.starting_bombs,
            range: self.rules.starting_range,
            heading: Some(Direction::Down),
            alive: true,
        });
        id
    }

    /// Looks up a character by id, dead or alive
    pub fn character(&self, id: AgentId) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Every character ever spawned, indexed by id
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Ids of the characters still alive
    pub fn alive_ids(&self) -> Vec<AgentId> {
        self.characters.iter().filter(|c| c.alive).map(|c| c.id).collect()
    }

    /// Pixel position of the centre of `cell`
    pub fn cell_center(&self, cell: GridCoordinates) -> (f64, f64) {
        let size = self.rules.tile_size;
        ((cell.col as f64 + 0.5) * size, (cell.row as f64 + 0.5) * size)
    }

    fn bomb_count(&self, id: AgentId) -> u32 {
        self.bombs.iter().filter(|b| b.owner == Some(id)).count() as u32
    }

    /// Read-only snapshot handed to the character's controller
    pub fn agent_state(&self, id: AgentId) -> Option<AgentState> {
        let character = self.characters.get(id)?;
        Some(AgentState {
            id,
            x: character.x,
            y: character.y,
            max_speed: character.max_speed,
            bomb_count: self.bomb_count(id),
            bomb_max: character.bomb_max,
            range: character.range,
            heading: character.heading,
        })
    }

    /// Applies a controller's intent: bomb placement first, then movement
    pub fn apply_intent(&mut self, id: AgentId, intent: AgentIntent) {
        let state = match self.agent_state(id) {
            Some(state) => state,
            None => return,
        };
        if !self.characters[id].alive {
            return;
        }

        if intent.place_device && state.bomb_count < state.bomb_max {
            let cell = self.to_grid(state.x, state.y);
            let fuse = self.rules.fuse_ticks();
            self.place_bomb(cell, state.range, fuse, Some(id));
        }

        if let Some(direction) = intent.direction {
            self.move_character(id, direction);
        }
    }

    fn move_character(&mut self, id: AgentId, direction: Direction) {
        let state = match self.agent_state(id) {
            Some(state) => state,
            None => return,
        };
        let cell = self.to_grid(state.x, state.y);
        let (center_x, center_y) = self.cell_center(cell);
        let blocked = self.is_colliding(&state, direction, state.max_speed);
        let (dx, dy) = direction.delta();

        let character = &mut self.characters[id];
        character.heading = Some(direction);
        match direction {
            Direction::Left | Direction::Right => {
                character.y = center_y;
                if !blocked {
                    character.x += dx * state.max_speed;
                }
            }
            Direction::Up | Direction::Down => {
                character.x = center_x;
                if !blocked {
                    character.y += dy * state.max_speed;
                }
            }
        }

        self.pick_up_bonus(id);
    }

    fn pick_up_bonus(&mut self, id: AgentId) {
        let (x, y) = (self.characters[id].x, self.characters[id].y);
        let cell = self.to_grid(x, y);
        let bonus = match self.bonus_kind(cell) {
            Some(bonus) => bonus,
            None => return,
        };
        self.set_tile(cell, TileKind::Empty);

        let max_speed = self.rules.tile_size / 4.0;
        let character = &mut self.characters[id];
        match bonus {
            BonusKind::BombUp => character.bomb_max += 1,
            BonusKind::RangeUp => character.range += 1,
            BonusKind::SpeedUp => character.max_speed = (character.max_speed + SPEED_STEP).min(max_speed),
            BonusKind::RangeDown => character.range = character.range.saturating_sub(1).max(1),
            BonusKind::SpeedDown => character.max_speed = (character.max_speed - SPEED_STEP).max(MIN_SPEED),
        }
        log::debug!("Character {} picked up {:?} at {:?}", id, bonus, cell);
    }

    /// Advances the world by one tick
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.time_remaining -= 1;

        // Sudden death starts the tick the clock reaches zero
        let collapse_every = self.rules.collapse_ticks() as i64;
        if self.time_remaining <= 0 && (-self.time_remaining) % collapse_every == 0 {
            self.collapse_next();
        }

        self.explosions.retain(|_, remaining| {
            *remaining -= 1;
            *remaining > 0
        });

        for bomb in self.bombs.iter_mut() {
            bomb.time_remaining = bomb.time_remaining.saturating_sub(1);
        }

        // Detonations can arm neighbours to zero, so keep going until none are left
        while let Some(idx) = self.bombs.iter().position(|b| b.time_remaining == 0) {
            let bomb = self.bombs.swap_remove(idx);
            self.detonate(bomb);
        }

        for character in self.characters.iter_mut().filter(|c| c.alive) {
            let size = self.rules.tile_size;
            let cell = GridCoordinates::new((character.x / size).floor() as i32, (character.y / size).floor() as i32);
            if self.explosions.contains_key(&cell) {
                character.alive = false;
                log::info!("Character {} caught in an explosion at {:?}", character.id, cell);
            }
        }
    }

    /// Walls in the next cell of the inward spiral, crushing whatever stands there
    fn collapse_next(&mut self) {
        while self.collapsed < self.collapse_order.len() {
            let cell = self.collapse_order[self.collapsed];
            self.collapsed += 1;
            if self.tile_kind(cell) == Some(TileKind::Unbreakable) {
                continue;
            }

            self.set_tile(cell, TileKind::Unbreakable);
            self.bombs.retain(|b| b.position != cell);
            self.explosions.remove(&cell);

            let size = self.rules.tile_size;
            for character in self.characters.iter_mut().filter(|c| c.alive) {
                let at = GridCoordinates::new((character.x / size).floor() as i32, (character.y / size).floor() as i32);
                if at == cell {
                    character.alive = false;
                    log::info!("Character {} crushed by collapsing terrain at {:?}", character.id, cell);
                }
            }
            log::debug!("Cell {:?} collapsed", cell);
            return;
        }
    }

    fn detonate(&mut self, bomb: Bomb) {
        let duration = self.rules.explosion_ticks();
        self.ignite(bomb.position, duration);

        for dir in Direction::all() {
            let mut cell = bomb.position;
            for _ in 0..bomb.range {
                cell = cell.neighbor(dir);
                match self.tile_kind(cell) {
                    None | Some(TileKind::Unbreakable) => break,
                    Some(TileKind::Breakable) => {
                        self.ignite(cell, duration);
                        self.destroy_breakable(cell);
                        break;
                    }
                    Some(TileKind::Bonus) => {
                        self.set_tile(cell, TileKind::Empty);
                        self.ignite(cell, duration);
                    }
                    Some(TileKind::Empty) => self.ignite(cell, duration),
                }

                for other in self.bombs.iter_mut().filter(|b| b.position == cell) {
                    other.time_remaining = 0;
                }
            }
        }
    }

    fn destroy_breakable(&mut self, cell: GridCoordinates) {
        if self.rng.random::<f64>() < self.rules.bonus_drop_chance {
            let kinds = BonusKind::all();
            let bonus = kinds[self.rng.random_range(0..kinds.len())];
            self.set_bonus(cell, bonus);
        } else {
            self.set_tile(cell, TileKind::Empty);
        }
    }
}

/// Every cell of a `width` x `height` grid, outer ring first, clockwise from the top-left
fn spiral_order(width: i32, height: i32) -> Vec<GridCoordinates> {
    let mut order = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
    let (mut left, mut top, mut right, mut bottom) = (0, 0, width - 1, height - 1);

    while left <= right && top <= bottom {
        for col in left..=right {
            order.push(GridCoordinates::new(col, top));
        }
        for row in top + 1..=bottom {
            order.push(GridCoordinates::new(right, row));
        }
        if top < bottom {
            for col in (left..right).rev() {
                order.push(GridCoordinates::new(col, bottom));
            }
        }
        if left < right {
            for row in (top + 1..bottom).rev() {
                order.push(GridCoordinates::new(left, row));
            }
        }
        left += 1;
        top += 1;
        right -= 1;
        bottom -= 1;
    }

    order
}

impl WorldQuery for Arena {
    fn tile_size(&self) -> f64 {
        self.rules.tile_size
    }

    fn fps(&self) -> u32 {
        self.rules.fps
    }

    fn time_remaining(&self) -> i64 {
        self.time_remaining
    }

    fn bomb_fuse_ticks(&self) -> u32 {
        self.rules.fuse_ticks()
    }

    fn is_inside_map(&self, cell: GridCoordinates) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.width && cell.row < self.height
    }

    fn tile_kind(&self, cell: GridCoordinates) -> Option<TileKind> {
        self.index(cell).map(|idx| self.tiles[idx])
    }

    fn first_bomb(&self, cell: GridCoordinates) -> Option<Bomb> {
        self.bombs.iter().find(|b| b.position == cell).copied()
    }

    fn explosion_time_remaining(&self, cell: GridCoordinates) -> Option<u32> {
        self.explosions.get(&cell).copied()
    }

    fn entities(&self, cell: GridCoordinates) -> Vec<Entity> {
        let characters = self
            .characters
            .iter()
            .filter(|c| c.alive && self.to_grid(c.x, c.y) == cell)
            .map(|c| Entity::Character(c.id));
        let bombs = self.bombs.iter().filter(|b| b.position == cell).map(|_| Entity::Bomb);
        characters.chain(bombs).collect()
    }

    fn bonus_kind(&self, cell: GridCoordinates) -> Option<BonusKind> {
        self.bonuses.get(&cell).copied()
    }

    fn is_colliding(&self, agent: &AgentState, direction: Direction, distance: f64) -> bool {
        let half = self.rules.tile_size * self.rules.hitbox_ratio / 2.0;
        let (dx, dy) = direction.delta();
        let cell = self.to_grid(agent.x, agent.y);
        let leading = self.to_grid(
            agent.x + dx * (half + distance),
            agent.y + dy * (half + distance),
        );
        if leading == cell {
            return false;
        }

        let ahead = cell.neighbor(direction);
        self.is_collidable(ahead) || self.has_bomb(ahead)
    }
}

impl fmt::Display for Arena {
    /// ASCII dump: characters as digits, bombs `o`, explosions `*`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            let mut line = String::with_capacity(self.width as usize);
            for col in 0..self.width {
                let cell = GridCoordinates::new(col, row);
                let character = self
                    .characters
                    .iter()
                    .find(|c| c.alive && self.to_grid(c.x, c.y) == cell);
                let ch = if let Some(c) = character {
                    std::char::from_digit((c.id % 10) as u32, 10).unwrap_or('@')
                } else if self.is_exploding(cell) {
                    '*'
                } else if self.has_bomb(cell) {
                    'o'
                } else {
                    match self.tile_kind(cell) {
                        Some(TileKind::Unbreakable) => '#',
                        Some(TileKind::Breakable) => '+',
                        Some(TileKind::Bonus) if crate::world::is_good_bonus(self, cell) => 'g',
                        Some(TileKind::Bonus) => 'b',
                        _ => '.',
                    }
                };
                line.push(ch);
            }
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
