//! Pre-authored component snippets. Each component offers two variants and
//! hooks itself into the runtime through `update_hooks`, `draw_hooks` or
//! `event_hooks`, so any combination can be spliced into one program.

use serde::Serialize;

use crate::model::Choice;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movement,
    Combat,
    Ui,
    World,
}

impl Category {
    pub fn header(self) -> &'static str {
        match self {
            Category::Movement => "Movement Systems",
            Category::Combat => "Combat Systems",
            Category::Ui => "UI Systems",
            Category::World => "World Systems",
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct ComponentVariant {
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub code: &'static str,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct ComponentDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    #[serde(rename = "variantA")]
    pub variant_a: ComponentVariant,
    #[serde(rename = "variantB")]
    pub variant_b: ComponentVariant,
}

impl ComponentDefinition {
    pub fn variant(&self, choice: Choice) -> &ComponentVariant {
        match choice {
            Choice::A => &self.variant_a,
            Choice::B => &self.variant_b,
        }
    }
}

pub fn components() -> &'static [ComponentDefinition] {
    COMPONENTS
}

pub fn find_component(id: &str) -> Option<&'static ComponentDefinition> {
    COMPONENTS.iter().find(|c| c.id == id)
}

static COMPONENTS: &[ComponentDefinition] = &[
    ComponentDefinition {
        id: "player_movement",
        name: "Player Movement",
        category: Category::Movement,
        variant_a: ComponentVariant {
            label: "Instant",
            description: "Arrow keys or WASD set the velocity directly.",
            code: PLAYER_MOVEMENT_A,
        },
        variant_b: ComponentVariant {
            label: "Smooth",
            description: "Acceleration and friction for a heavier feel.",
            code: PLAYER_MOVEMENT_B,
        },
    },
    ComponentDefinition {
        id: "jump_physics",
        name: "Jump Physics",
        category: Category::Movement,
        variant_a: ComponentVariant {
            label: "Fixed Jump",
            description: "Space jumps with a constant force while grounded.",
            code: JUMP_PHYSICS_A,
        },
        variant_b: ComponentVariant {
            label: "Variable Jump",
            description: "Releasing space early cuts the jump short; double jump allowed.",
            code: JUMP_PHYSICS_B,
        },
    },
    ComponentDefinition {
        id: "shooting",
        name: "Shooting",
        category: Category::Combat,
        variant_a: ComponentVariant {
            label: "Single Shot",
            description: "Z fires one projectile in the facing direction.",
            code: SHOOTING_A,
        },
        variant_b: ComponentVariant {
            label: "Spread Shot",
            description: "Z fires three projectiles in a fan.",
            code: SHOOTING_B,
        },
    },
    ComponentDefinition {
        id: "health_system",
        name: "Health System",
        category: Category::Combat,
        variant_a: ComponentVariant {
            label: "Hearts",
            description: "Three hearts; enemies take one per hit.",
            code: HEALTH_SYSTEM_A,
        },
        variant_b: ComponentVariant {
            label: "Health Bar",
            description: "A 100 point bar; enemies deal their damage property.",
            code: HEALTH_SYSTEM_B,
        },
    },
    ComponentDefinition {
        id: "score_display",
        name: "Score Display",
        category: Category::Ui,
        variant_a: ComponentVariant {
            label: "Corner Score",
            description: "Score text in the top-left corner.",
            code: SCORE_DISPLAY_A,
        },
        variant_b: ComponentVariant {
            label: "Score Popups",
            description: "Score plus a floating popup on every pickup.",
            code: SCORE_DISPLAY_B,
        },
    },
    ComponentDefinition {
        id: "pause_menu",
        name: "Pause Menu",
        category: Category::Ui,
        variant_a: ComponentVariant {
            label: "Simple Pause",
            description: "P toggles a dimmed PAUSED overlay.",
            code: PAUSE_MENU_A,
        },
        variant_b: ComponentVariant {
            label: "Pause Menu",
            description: "P opens a menu with resume and quit options.",
            code: PAUSE_MENU_B,
        },
    },
    ComponentDefinition {
        id: "camera_follow",
        name: "Camera Follow",
        category: Category::World,
        variant_a: ComponentVariant {
            label: "Locked",
            description: "The camera stays centred on the player.",
            code: CAMERA_FOLLOW_A,
        },
        variant_b: ComponentVariant {
            label: "Smooth",
            description: "The camera eases toward the player inside the level bounds.",
            code: CAMERA_FOLLOW_B,
        },
    },
];

const PLAYER_MOVEMENT_A: &str = r#"game_state["custom_movement"] = True


def player_movement_update(keys):
    player = find_object("player")
    if player is None:
        return
    speed = player.properties.get("speed", 5)
    right = keys[pygame.K_RIGHT] or keys[pygame.K_d]
    left = keys[pygame.K_LEFT] or keys[pygame.K_a]
    player.vel_x = (right - left) * speed
    if not PHYSICS_ENABLED:
        down = keys[pygame.K_DOWN] or keys[pygame.K_s]
        up = keys[pygame.K_UP] or keys[pygame.K_w]
        player.vel_y = (down - up) * speed


update_hooks.append(player_movement_update)
"#;

const PLAYER_MOVEMENT_B: &str = r#"game_state["custom_movement"] = True
MOVE_ACCELERATION = 0.6
MOVE_FRICTION = 0.85


def player_movement_update(keys):
    player = find_object("player")
    if player is None:
        return
    top_speed = player.properties.get("speed", 5)
    direction = (keys[pygame.K_RIGHT] or keys[pygame.K_d]) - (keys[pygame.K_LEFT] or keys[pygame.K_a])
    if direction:
        player.vel_x += direction * MOVE_ACCELERATION
    else:
        player.vel_x *= MOVE_FRICTION
    player.vel_x = max(-top_speed, min(top_speed, player.vel_x))
    if abs(player.vel_x) < 0.05:
        player.vel_x = 0.0


update_hooks.append(player_movement_update)
"#;

const JUMP_PHYSICS_A: &str = r#"JUMP_FORCE = 12


def jump_physics_event(event):
    if event.type == pygame.KEYDOWN and event.key in (pygame.K_SPACE, pygame.K_UP):
        player = find_object("player")
        if player is not None and (player.on_ground or not PHYSICS_ENABLED):
            player.vel_y = -JUMP_FORCE
            player.on_ground = False


event_hooks.append(jump_physics_event)
"#;

const JUMP_PHYSICS_B: &str = r#"JUMP_FORCE = 13
JUMP_CUT = 0.45
MAX_JUMPS = 2
jump_state = {"jumps": 0}


def jump_physics_event(event):
    player = find_object("player")
    if player is None:
        return
    if player.on_ground:
        jump_state["jumps"] = 0
    if event.type == pygame.KEYDOWN and event.key == pygame.K_SPACE:
        if jump_state["jumps"] < MAX_JUMPS:
            player.vel_y = -JUMP_FORCE
            player.on_ground = False
            jump_state["jumps"] += 1
    elif event.type == pygame.KEYUP and event.key == pygame.K_SPACE:
        if player.vel_y < 0:
            player.vel_y *= JUMP_CUT


event_hooks.append(jump_physics_event)
"#;

const SHOOTING_A: &str = r#"shooting_state = {"facing": "right", "last_shot": 0}
SHOT_COOLDOWN_MS = 250


def shooting_update(keys):
    if keys[pygame.K_LEFT]:
        shooting_state["facing"] = "left"
    elif keys[pygame.K_RIGHT]:
        shooting_state["facing"] = "right"


def shooting_event(event):
    if event.type != pygame.KEYDOWN or event.key != pygame.K_z:
        return
    player = find_object("player")
    now = pygame.time.get_ticks()
    if player is None or now - shooting_state["last_shot"] < SHOT_COOLDOWN_MS:
        return
    shooting_state["last_shot"] = now
    spawn_projectile(player, {"direction": shooting_state["facing"], "projectileSpeed": 12})


update_hooks.append(shooting_update)
event_hooks.append(shooting_event)
"#;

const SHOOTING_B: &str = r#"shooting_state = {"facing": "right", "last_shot": 0}
SHOT_COOLDOWN_MS = 450
SPREAD_ANGLES = (-15, 0, 15)


def shooting_update(keys):
    if keys[pygame.K_LEFT]:
        shooting_state["facing"] = "left"
    elif keys[pygame.K_RIGHT]:
        shooting_state["facing"] = "right"


def shooting_event(event):
    if event.type != pygame.KEYDOWN or event.key != pygame.K_z:
        return
    player = find_object("player")
    now = pygame.time.get_ticks()
    if player is None or now - shooting_state["last_shot"] < SHOT_COOLDOWN_MS:
        return
    shooting_state["last_shot"] = now
    for offset in SPREAD_ANGLES:
        spawn_projectile(player, {"direction": shooting_state["facing"], "projectileSpeed": 10}, offset)


update_hooks.append(shooting_update)
event_hooks.append(shooting_event)
"#;

const HEALTH_SYSTEM_A: &str = r#"health_state = {"hearts": 3, "invulnerable_until": 0}
HEART_COLOR = (230, 57, 70)


def health_update(keys):
    player = find_object("player")
    if player is None:
        return
    now = pygame.time.get_ticks()
    if now < health_state["invulnerable_until"]:
        return
    for obj in game_objects:
        if obj.alive and obj.obj_type == "enemy" and obj.rect.colliderect(player.rect):
            health_state["hearts"] -= 1
            health_state["invulnerable_until"] = now + 1000
            if health_state["hearts"] <= 0:
                player.alive = False
                emit_event("player_died")
            break


def health_draw(surface):
    for index in range(health_state["hearts"]):
        pygame.draw.circle(surface, HEART_COLOR, (SCREEN_WIDTH - 24 - index * 28, 24), 10)


update_hooks.append(health_update)
draw_hooks.append(health_draw)
"#;

const HEALTH_SYSTEM_B: &str = r#"health_state = {"health": 100, "max_health": 100, "invulnerable_until": 0}


def health_update(keys):
    player = find_object("player")
    if player is None:
        return
    now = pygame.time.get_ticks()
    if now < health_state["invulnerable_until"]:
        return
    for obj in game_objects:
        if obj.alive and obj.obj_type == "enemy" and obj.rect.colliderect(player.rect):
            health_state["health"] -= obj.properties.get("damage", 10)
            health_state["invulnerable_until"] = now + 500
            if health_state["health"] <= 0:
                health_state["health"] = 0
                player.alive = False
                emit_event("player_died")
            break


def health_draw(surface):
    ratio = health_state["health"] / health_state["max_health"]
    outline = pygame.Rect(SCREEN_WIDTH - 220, 16, 200, 16)
    pygame.draw.rect(surface, (60, 60, 60), outline)
    fill = outline.copy()
    fill.width = int(outline.width * ratio)
    pygame.draw.rect(surface, (76, 201, 100), fill)
    pygame.draw.rect(surface, (255, 255, 255), outline, 2)


update_hooks.append(health_update)
draw_hooks.append(health_draw)
"#;

const SCORE_DISPLAY_A: &str = r#"def score_draw(surface):
    text = font.render(f"Score: {game_state['score']}", True, (255, 255, 255))
    surface.blit(text, (16, 16))


draw_hooks.append(score_draw)
"#;

const SCORE_DISPLAY_B: &str = r#"score_popups = []


def score_event(event):
    if event.type == CUSTOM_EVENT and getattr(event, "name", None) == "collected":
        player = find_object("player")
        x, y = (player.rect.centerx, player.rect.top) if player else (SCREEN_WIDTH // 2, 60)
        score_popups.append({"text": f"+{event.points}", "x": x, "y": y, "until": pygame.time.get_ticks() + 800})


def score_draw(surface):
    text = font.render(f"Score: {game_state['score']}", True, (255, 255, 255))
    surface.blit(text, (16, 16))
    now = pygame.time.get_ticks()
    score_popups[:] = [p for p in score_popups if p["until"] > now]
    for popup in score_popups:
        rise = (800 - (popup["until"] - now)) // 20
        label = font.render(popup["text"], True, (255, 209, 102))
        surface.blit(label, (popup["x"] - game_state["camera_x"], popup["y"] - rise - game_state["camera_y"]))


event_hooks.append(score_event)
draw_hooks.append(score_draw)
"#;

const PAUSE_MENU_A: &str = r#"def pause_event(event):
    if event.type == pygame.KEYDOWN and event.key == pygame.K_p:
        game_state["paused"] = not game_state["paused"]


def pause_draw(surface):
    if not game_state["paused"]:
        return
    shade = pygame.Surface((SCREEN_WIDTH, SCREEN_HEIGHT), pygame.SRCALPHA)
    shade.fill((0, 0, 0, 140))
    surface.blit(shade, (0, 0))
    label = font.render("PAUSED", True, (255, 255, 255))
    surface.blit(label, label.get_rect(center=(SCREEN_WIDTH // 2, SCREEN_HEIGHT // 2)))


event_hooks.append(pause_event)
draw_hooks.append(pause_draw)
"#;

const PAUSE_MENU_B: &str = r#"PAUSE_OPTIONS = ("Resume", "Restart Score", "Quit")
pause_state = {"selected": 0}


def pause_event(event):
    if event.type != pygame.KEYDOWN:
        return
    if event.key == pygame.K_p:
        game_state["paused"] = not game_state["paused"]
        pause_state["selected"] = 0
    elif game_state["paused"]:
        if event.key == pygame.K_UP:
            pause_state["selected"] = (pause_state["selected"] - 1) % len(PAUSE_OPTIONS)
        elif event.key == pygame.K_DOWN:
            pause_state["selected"] = (pause_state["selected"] + 1) % len(PAUSE_OPTIONS)
        elif event.key == pygame.K_RETURN:
            choice = PAUSE_OPTIONS[pause_state["selected"]]
            if choice == "Resume":
                game_state["paused"] = False
            elif choice == "Restart Score":
                game_state["score"] = 0
                game_state["paused"] = False
            else:
                pygame.event.post(pygame.event.Event(pygame.QUIT))


def pause_draw(surface):
    if not game_state["paused"]:
        return
    shade = pygame.Surface((SCREEN_WIDTH, SCREEN_HEIGHT), pygame.SRCALPHA)
    shade.fill((0, 0, 0, 170))
    surface.blit(shade, (0, 0))
    for index, option in enumerate(PAUSE_OPTIONS):
        color = (255, 209, 102) if index == pause_state["selected"] else (255, 255, 255)
        label = font.render(option, True, color)
        surface.blit(label, label.get_rect(center=(SCREEN_WIDTH // 2, SCREEN_HEIGHT // 2 - 40 + index * 40)))


event_hooks.append(pause_event)
draw_hooks.append(pause_draw)
"#;

const CAMERA_FOLLOW_A: &str = r#"def camera_update(keys):
    player = find_object("player")
    if player is None:
        return
    game_state["camera_x"] = player.rect.centerx - SCREEN_WIDTH // 2
    game_state["camera_y"] = player.rect.centery - SCREEN_HEIGHT // 2


update_hooks.append(camera_update)
"#;

const CAMERA_FOLLOW_B: &str = r#"CAMERA_EASE = 0.1


def camera_update(keys):
    player = find_object("player")
    if player is None:
        return
    right_edge = max((obj.rect.right for obj in game_objects), default=SCREEN_WIDTH)
    bottom_edge = max((obj.rect.bottom for obj in game_objects), default=SCREEN_HEIGHT)
    target_x = player.rect.centerx - SCREEN_WIDTH // 2
    target_y = player.rect.centery - SCREEN_HEIGHT // 2
    target_x = max(0, min(target_x, right_edge - SCREEN_WIDTH))
    target_y = max(0, min(target_y, bottom_edge - SCREEN_HEIGHT))
    game_state["camera_x"] += int((target_x - game_state["camera_x"]) * CAMERA_EASE)
    game_state["camera_y"] += int((target_y - game_state["camera_y"]) * CAMERA_EASE)


update_hooks.append(camera_update)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_ids_are_unique() {
        let mut ids: Vec<&str> = components().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), components().len());
    }

    #[test]
    fn every_variant_registers_a_hook() {
        for component in components() {
            for choice in [Choice::A, Choice::B] {
                let code = component.variant(choice).code;
                assert!(code.contains("_hooks.append("), "{} {:?}", component.id, choice);
                assert!(code.ends_with('\n'));
            }
        }
    }

    #[test]
    fn lookup_by_id() {
        let shooting = find_component("shooting").expect("shooting exists");
        assert_eq!(shooting.category, Category::Combat);
        assert!(shooting.variant(Choice::B).code.contains("SPREAD_ANGLES"));
        assert!(find_component("laser_grid").is_none());
    }

    #[test]
    fn headers_match_categories() {
        assert_eq!(Category::Movement.header(), "Movement Systems");
        assert_eq!(Category::Ui.header(), "UI Systems");
    }
}
