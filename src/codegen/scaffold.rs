//! Fixed runtime text spliced around the generated constants and objects.
//!
//! Component snippets talk to the runtime only through `update_hooks`,
//! `draw_hooks`, `event_hooks`, `game_state` and the helpers defined here.

pub const IMPORTS: &str = "\
import math
import random
import sys

import pygame
";

pub const DISPLAY_SETUP: &str = "\
screen = pygame.display.set_mode((SCREEN_WIDTH, SCREEN_HEIGHT))
pygame.display.set_caption(GAME_TITLE)
clock = pygame.time.Clock()
font = pygame.font.Font(None, 28)
";

pub const RUNTIME: &str = r#"GRAVITY = 0.5
MAX_FALL_SPEED = 12

TYPE_COLORS = {
    "player": (66, 135, 245),
    "enemy": (230, 57, 70),
    "platform": (120, 94, 60),
    "collectible": (255, 209, 102),
    "obstacle": (90, 90, 90),
    "projectile": (255, 255, 255),
}

DIRECTIONS = {
    "left": (-1, 0),
    "right": (1, 0),
    "up": (0, -1),
    "down": (0, 1),
}

KEY_NAMES = {
    "space": pygame.K_SPACE,
    "up": pygame.K_UP,
    "down": pygame.K_DOWN,
    "left": pygame.K_LEFT,
    "right": pygame.K_RIGHT,
    "enter": pygame.K_RETURN,
    "shift": pygame.K_LSHIFT,
}

CUSTOM_EVENT = pygame.USEREVENT + 1

game_objects = []
pending_objects = []
update_hooks = []
draw_hooks = []
event_hooks = []
game_state = {
    "score": 0,
    "paused": False,
    "custom_movement": False,
    "camera_x": 0,
    "camera_y": 0,
}


def key_code(name):
    if name is None:
        return None
    if name in KEY_NAMES:
        return KEY_NAMES[name]
    try:
        return pygame.key.key_code(name)
    except (ValueError, AttributeError):
        return None


def parse_color(value, fallback):
    if isinstance(value, (list, tuple)) and len(value) >= 3:
        return tuple(max(0, min(255, int(c))) for c in value[:3])
    if isinstance(value, str):
        try:
            return pygame.Color(value)
        except ValueError:
            return fallback
    return fallback


def emit_event(name, **data):
    pygame.event.post(pygame.event.Event(CUSTOM_EVENT, name=name, **data))


def find_object(obj_type):
    for obj in game_objects:
        if obj.alive and obj.obj_type == obj_type:
            return obj
    return None


class GameObject:
    uses_gravity = False
    solid = False

    def __init__(self, obj_type, x, y, width=40, height=40, name="", layer=0,
                 visible=True, properties=None, behaviors=None):
        self.obj_type = obj_type
        self.name = name or obj_type
        self.rect = pygame.Rect(int(x), int(y), max(1, int(width)), max(1, int(height)))
        self.pos_x = float(x)
        self.pos_y = float(y)
        self.start_x = float(x)
        self.start_y = float(y)
        self.vel_x = 0.0
        self.vel_y = 0.0
        self.angle = 0.0
        self.layer = layer
        self.visible = visible
        self.alive = True
        self.on_ground = False
        self.destroy_at = None
        self.properties = dict(properties or {})
        self.behaviors = [dict(b) for b in (behaviors or [])]
        self.timers = {}
        self.patrol_dir = 1
        self.bounce_phase = 0.0
        self.spawned = []
        self.color = parse_color(
            self.properties.get("color"),
            TYPE_COLORS.get(obj_type, (200, 200, 200)),
        )
        if "gravity" in self.properties:
            self.uses_gravity = bool(self.properties["gravity"])
        if "solid" in self.properties:
            self.solid = bool(self.properties["solid"])

    def behaviors_with(self, trigger_type):
        return [b for b in self.behaviors if b["trigger"].get("type") == trigger_type]

    def update(self, keys):
        now = pygame.time.get_ticks()
        for behavior in self.behaviors:
            trigger = behavior["trigger"]
            kind = trigger.get("type")
            if kind == "always":
                self.run_behavior(behavior)
            elif kind == "onKeyPress":
                code = key_code(trigger.get("key"))
                if code is not None and keys[code]:
                    self.run_behavior(behavior)
            elif kind == "onTimer":
                interval = trigger.get("intervalMs", 1000)
                last = self.timers.setdefault(behavior["id"], now)
                if now - last >= interval:
                    self.timers[behavior["id"]] = now
                    self.run_behavior(behavior)
        if PHYSICS_ENABLED and self.uses_gravity:
            self.vel_y = min(self.vel_y + GRAVITY, MAX_FALL_SPEED)
        self.pos_x += self.vel_x
        self.pos_y += self.vel_y
        self.rect.topleft = (int(self.pos_x), int(self.pos_y))
        if self.destroy_at is not None and now >= self.destroy_at:
            self.alive = False

    def handle_event(self, event):
        if event.type == pygame.MOUSEBUTTONDOWN and self.screen_rect().collidepoint(event.pos):
            for behavior in self.behaviors_with("onClick"):
                self.run_behavior(behavior)
        elif event.type == CUSTOM_EVENT:
            for behavior in self.behaviors_with("onEvent"):
                if behavior["trigger"].get("name") == getattr(event, "name", None):
                    self.run_behavior(behavior)

    def on_collision(self, other):
        for behavior in self.behaviors_with("onCollision"):
            wanted = behavior["trigger"].get("with")
            if wanted is None or wanted == other.obj_type:
                self.run_behavior(behavior, other)

    def run_behavior(self, behavior, other=None):
        params = behavior.get("params", {})
        kind = behavior["type"]
        if kind == "move":
            dx, dy = DIRECTIONS.get(params.get("direction", "right"), (1, 0))
            speed = params.get("speed", 5)
            self.pos_x += dx * speed
            self.pos_y += dy * speed
        elif kind == "patrol":
            self.pos_x += self.patrol_dir * params.get("speed", 2)
            if abs(self.pos_x - self.start_x) >= params.get("distance", 100):
                self.patrol_dir *= -1
        elif kind == "follow":
            target = find_object(params.get("target", "player"))
            if target is not None and target is not self:
                dx = target.pos_x - self.pos_x
                dy = target.pos_y - self.pos_y
                distance = math.hypot(dx, dy)
                if distance > 1:
                    speed = params.get("speed", 3)
                    self.pos_x += dx / distance * speed
                    self.pos_y += dy / distance * speed
        elif kind == "rotate":
            self.angle = (self.angle + params.get("speed", 2)) % 360
        elif kind == "bounce":
            self.bounce_phase += params.get("speed", 2) * 0.05
            self.pos_y = self.start_y - abs(math.sin(self.bounce_phase)) * params.get("height", 10)
        elif kind == "jump":
            if self.on_ground or not PHYSICS_ENABLED:
                self.vel_y = -params.get("force", 15)
                self.on_ground = False
        elif kind == "shoot":
            now = pygame.time.get_ticks()
            key = behavior["id"] + ":shot"
            if now - self.timers.get(key, -10 ** 9) >= params.get("cooldownMs", 500):
                self.timers[key] = now
                spawn_projectile(self, params)
        elif kind == "collect":
            if other is not None and self.alive:
                game_state["score"] += params.get("points", 10)
                self.alive = False
                emit_event("collected", points=params.get("points", 10))
        elif kind == "spawn":
            alive = [obj for obj in self.spawned if obj.alive]
            if len(alive) < params.get("maxCount", 5):
                spawned = create_game_object(params.get("entityType", "enemy"), self.pos_x, self.pos_y)
                spawned.layer = self.layer
                self.spawned = alive + [spawned]
                pending_objects.append(spawned)
        elif kind == "destroy":
            if self.destroy_at is None:
                self.destroy_at = pygame.time.get_ticks() + params.get("delayMs", 0)

    def screen_rect(self):
        return self.rect.move(-game_state["camera_x"], -game_state["camera_y"])

    def draw(self, surface):
        target = self.screen_rect()
        if self.angle:
            image = pygame.Surface(self.rect.size, pygame.SRCALPHA)
            image.fill(self.color)
            rotated = pygame.transform.rotate(image, self.angle)
            surface.blit(rotated, rotated.get_rect(center=target.center))
        else:
            pygame.draw.rect(surface, self.color, target)
        if DEBUG_MODE:
            pygame.draw.rect(surface, (255, 255, 0), target, 1)


class Player(GameObject):
    uses_gravity = True

    def update(self, keys):
        if not game_state["custom_movement"]:
            speed = self.properties.get("speed", 5)
            self.vel_x = (keys[pygame.K_RIGHT] - keys[pygame.K_LEFT]) * speed
            if not PHYSICS_ENABLED:
                self.vel_y = (keys[pygame.K_DOWN] - keys[pygame.K_UP]) * speed
        super().update(keys)
        self.pos_x = max(0.0, min(self.pos_x, SCREEN_WIDTH - self.rect.width + game_state["camera_x"]))
        self.rect.x = int(self.pos_x)


class Enemy(GameObject):
    def on_collision(self, other):
        super().on_collision(other)
        if other.obj_type == "projectile" and other.properties.get("owner") != self.obj_type:
            self.alive = False
            other.alive = False
            game_state["score"] += self.properties.get("points", 5)


class Platform(GameObject):
    solid = True


def spawn_projectile(owner, params, angle_offset=0.0):
    dx, dy = DIRECTIONS.get(params.get("direction", "right"), (1, 0))
    angle = math.atan2(dy, dx) + math.radians(angle_offset)
    speed = params.get("projectileSpeed", 10)
    projectile = GameObject(
        "projectile",
        owner.rect.centerx,
        owner.rect.centery,
        8,
        4,
        layer=owner.layer,
        properties={"owner": owner.obj_type},
    )
    projectile.vel_x = math.cos(angle) * speed
    projectile.vel_y = math.sin(angle) * speed
    projectile.destroy_at = pygame.time.get_ticks() + 2000
    pending_objects.append(projectile)
    return projectile


OBJECT_CLASSES = {
    "player": Player,
    "enemy": Enemy,
    "platform": Platform,
}


def create_game_object(obj_type, x, y, width=40, height=40, **kwargs):
    cls = OBJECT_CLASSES.get(obj_type, GameObject)
    return cls(obj_type, x, y, width, height, **kwargs)


def resolve_collisions():
    live = [obj for obj in game_objects if obj.alive]
    for obj in live:
        obj.on_ground = False
    for index, first in enumerate(live):
        for second in live[index + 1:]:
            if not first.rect.colliderect(second.rect):
                continue
            for mover, wall in ((first, second), (second, first)):
                if wall.solid and not mover.solid and mover.vel_y >= 0:
                    if mover.rect.bottom - mover.vel_y <= wall.rect.top + 1:
                        mover.pos_y = wall.rect.top - mover.rect.height
                        mover.rect.y = int(mover.pos_y)
                        mover.vel_y = 0.0
                        mover.on_ground = True
            first.on_collision(second)
            second.on_collision(first)


def draw_grid(surface):
    color = (40, 40, 40)
    for x in range(0, SCREEN_WIDTH, GRID_SIZE):
        pygame.draw.line(surface, color, (x, 0), (x, SCREEN_HEIGHT))
    for y in range(0, SCREEN_HEIGHT, GRID_SIZE):
        pygame.draw.line(surface, color, (0, y), (SCREEN_WIDTH, y))
"#;

pub const LAYER_SORT: &str = "game_objects.sort(key=lambda obj: obj.layer)\n";

pub const MAIN_LOOP: &str = r#"background = parse_color(BACKGROUND_COLOR, (0, 0, 0))
running = True
while running:
    for event in pygame.event.get():
        if event.type == pygame.QUIT:
            running = False
        elif event.type == pygame.KEYDOWN and event.key == pygame.K_ESCAPE:
            running = False
        else:
            for hook in event_hooks:
                hook(event)
            for obj in game_objects:
                obj.handle_event(event)

    if not game_state["paused"]:
        keys = pygame.key.get_pressed()
        for obj in game_objects:
            obj.update(keys)
        resolve_collisions()
        for hook in update_hooks:
            hook(keys)
        game_objects.extend(pending_objects)
        pending_objects.clear()
        game_objects[:] = [obj for obj in game_objects if obj.alive]
        game_objects.sort(key=lambda obj: obj.layer)

    screen.fill(background)
    if SHOW_GRID:
        draw_grid(screen)
    for obj in game_objects:
        if obj.visible:
            obj.draw(screen)
    for hook in draw_hooks:
        hook(screen)
    pygame.display.flip()
    clock.tick(FPS)

pygame.quit()
sys.exit()
"#;
