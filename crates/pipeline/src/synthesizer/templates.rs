//! Literal template banks for the deterministic fallback path.

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rating tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const MOVIE_TIER_TOP: &str = "Must watch yaar!";
pub const MOVIE_TIER_MID: &str = "Pretty solid film!";
pub const MOVIE_TIER_LOW: &str = "Mixed reviews, but might surprise you";

pub const GAME_TIER_TOP: &str = "This game is absolutely fire!";
pub const GAME_TIER_MID: &str = "Pretty solid gameplay!";
pub const GAME_TIER_LOW: &str = "Mixed reviews, but could still be fun";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Section headers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const MOVIE_HEADERS: &[&str] = &[
    "Arre, here's what I found for you:",
    "Okay movie buff, check these out:",
    "Popcorn ready? Here you go:",
];

pub const PEOPLE_HEADERS: &[&str] = &[
    "Here are the stars I found:",
    "Let me introduce you to these folks:",
];

pub const GAME_HEADERS: &[&str] = &[
    "Gamer mode on! Here's the list:",
    "Controller ready? Check these out:",
    "Found some games for you, boss:",
];

pub const RESEARCH_HEADERS: &[&str] = &[
    "Here's what the internet says:",
    "I did some digging, dekho:",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Nothing found
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const CINEPHILE_EMPTY: &[&str] = &[
    "Hmm, I couldn't pull up any movies for that. Give me a title, an actor or a genre and I'll dig in!",
    "Yaar, my movie radar came back empty. Can you tell me a bit more, like a name or the vibe you want?",
];

pub const GAME_EMPTY: &[&str] = &[
    "No games showed up for that one. Try a title, a genre or a platform like PS5 or PC!",
    "My game library search came back blank, boss. Tell me what kind of game you're in the mood for?",
];

pub const RESEARCH_EMPTY: &[&str] = &[
    "I couldn't find anything solid on that right now. Can you rephrase or add a few details?",
    "Search came back empty this time, yaar. Try asking it a little differently?",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat pools
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const GREETING: &[&str] = &[
    "Hey hey! Kya haal hai? What's on your mind today?",
    "Hello ji! Ready to talk movies, games or anything else?",
    "Yo! Good to see you. What are we chatting about?",
];

pub const EMOTIONAL_NEGATIVE: &[&str] = &[
    "Aww, sorry you're feeling this way. I'm here, want to talk about it?",
    "That sounds tough, yaar. Sometimes just saying it out loud helps. What's going on?",
    "Sending you a virtual chai and a hug. You don't have to go through it alone.",
];

pub const EMOTIONAL_POSITIVE: &[&str] = &[
    "Arre wah! Love that energy. What's got you so happy?",
    "That's awesome! Tell me everything!",
    "Yay! Good vibes only. What happened?",
];

pub const JOKE: &[&str] = &[
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
    "I told my computer I needed a break, and it said: no problem, I'll go to sleep.",
    "Why don't skeletons fight each other? They don't have the guts!",
];

pub const IDENTITY: &[&str] = &[
    "I'm Mux, your desi-friendly chat buddy! I can talk movies, games, look things up or just chill and chat.",
    "Main hoon Mux! Movie recommendations, game picks, quick research or plain gupshup, I'm your bot.",
];

pub const ADVICE: &[&str] = &[
    "Okay, let's think it through. What are the options, and what matters most to you here?",
    "Tough call! Write down the pros and cons, then go with the one you'd regret skipping. Want to talk it out?",
];

pub const SHORT_DEFAULT: &[&str] = &[
    "Interesting! Tell me more?",
    "Hmm, go on, I'm listening!",
    "Achha? Say more, yaar!",
];

pub const LONG_DEFAULT: &[&str] = &[
    "That's a lot to think about, and I appreciate you sharing it. What part of it matters most to you?",
    "I hear you. There's a lot going on there. Want to dig into one piece of it together?",
    "Thanks for laying that out. Honestly, that deserves some thought. Where do you want to start?",
];
