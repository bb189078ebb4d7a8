//! Built-in nominee list (98th Academy Awards) offered when no categories are configured.

use crate::dao::models::CategoryEntity;

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Best Picture",
        &[
            "Bugonia",
            "F1",
            "Frankenstein",
            "Hamnet",
            "Marty Supreme",
            "One Battle After Another",
            "The Secret Agent",
            "Sentimental Value",
            "Sinners",
            "Train Dreams",
        ],
    ),
    (
        "Best Director",
        &[
            "Paul Thomas Anderson — One Battle After Another",
            "Ryan Coogler — Sinners",
            "Josh Safdie — Marty Supreme",
            "Joachim Trier — Sentimental Value",
            "Chloé Zhao — Hamnet",
        ],
    ),
    (
        "Best Actor",
        &[
            "Timothée Chalamet — Marty Supreme",
            "Leonardo DiCaprio — One Battle After Another",
            "Ethan Hawke — Blue Moon",
            "Michael B. Jordan — Sinners",
            "Wagner Moura — The Secret Agent",
        ],
    ),
    (
        "Best Actress",
        &[
            "Jessie Buckley — Hamnet",
            "Rose Byrne — If I Had Legs I'd Kick You",
            "Kate Hudson — Song Sung Blue",
            "Renate Reinsve — Sentimental Value",
            "Emma Stone — Bugonia",
        ],
    ),
    (
        "Best Supporting Actor",
        &[
            "Benicio del Toro — One Battle After Another",
            "Jacob Elordi — Frankenstein",
            "Delroy Lindo — Sinners",
            "Sean Penn — One Battle After Another",
            "Stellan Skarsgård — Sentimental Value",
        ],
    ),
    (
        "Best Supporting Actress",
        &[
            "Elle Fanning — Sentimental Value",
            "Inga Ibsdotter Lilleaas — Sentimental Value",
            "Amy Madigan — Weapons",
            "Wunmi Mosaku — Sinners",
            "Teyana Taylor — One Battle After Another",
        ],
    ),
    (
        "Best Original Screenplay",
        &[
            "Robert Kaplow — Blue Moon",
            "Jafar Panahi — It Was Just an Accident",
            "Ronald Bronstein & Josh Safdie — Marty Supreme",
            "Eskil Vogt & Joachim Trier — Sentimental Value",
            "Ryan Coogler — Sinners",
        ],
    ),
    (
        "Best Adapted Screenplay",
        &[
            "Will Tracy — Bugonia",
            "Guillermo del Toro — Frankenstein",
            "Chloé Zhao & Maggie O'Farrell — Hamnet",
            "Paul Thomas Anderson — One Battle After Another",
            "Clint Bentley & Greg Kwedar — Train Dreams",
        ],
    ),
    (
        "Best Animated Feature Film",
        &[
            "Arco",
            "Elio",
            "KPop Demon Hunters",
            "Little Amélie or the Character of Rain",
            "Zootopia 2",
        ],
    ),
    (
        "Best International Feature Film",
        &[
            "The Secret Agent (Brazil)",
            "It Was Just an Accident (France)",
            "Sentimental Value (Norway)",
            "Sirât (Spain)",
            "The Voice of Hind Rajab (Tunisia)",
        ],
    ),
    (
        "Best Documentary Feature",
        &[
            "The Alabama Solution",
            "Come See Me in the Good Light",
            "Cutting Through Rocks",
            "Mr. Nobody Against Putin",
            "The Perfect Neighbor",
        ],
    ),
    (
        "Best Original Score",
        &[
            "Jerskin Fendrix — Bugonia",
            "Alexandre Desplat — Frankenstein",
            "Max Richter — Hamnet",
            "Jonny Greenwood — One Battle After Another",
            "Ludwig Göransson — Sinners",
        ],
    ),
    (
        "Best Original Song",
        &[
            "\"Golden\" — KPop Demon Hunters",
            "\"Dear Me\" — Diane Warren: Relentless",
            "\"I Lied to You\" — Sinners",
            "\"Sweet Dreams of Joy\" — Viva Verdi!",
            "\"Train Dreams\" — Train Dreams",
        ],
    ),
    (
        "Best Cinematography",
        &[
            "Frankenstein",
            "Marty Supreme",
            "One Battle After Another",
            "Sinners",
            "Train Dreams",
        ],
    ),
    (
        "Best Film Editing",
        &[
            "F1",
            "Marty Supreme",
            "One Battle After Another",
            "Sentimental Value",
            "Sinners",
        ],
    ),
    (
        "Best Production Design",
        &[
            "Frankenstein",
            "Hamnet",
            "Marty Supreme",
            "One Battle After Another",
            "Sinners",
        ],
    ),
    (
        "Best Costume Design",
        &[
            "Avatar: Fire and Ash",
            "Frankenstein",
            "Hamnet",
            "Marty Supreme",
            "Sinners",
        ],
    ),
    (
        "Best Makeup and Hairstyling",
        &[
            "Frankenstein",
            "Kokuho",
            "Sinners",
            "The Smashing Machine",
            "The Ugly Stepsister",
        ],
    ),
    (
        "Best Sound",
        &[
            "F1",
            "Frankenstein",
            "One Battle After Another",
            "Sinners",
            "Sirât",
        ],
    ),
    (
        "Best Visual Effects",
        &[
            "Avatar: Fire and Ash",
            "F1",
            "Jurassic World Rebirth",
            "The Lost Bus",
            "Sinners",
        ],
    ),
    (
        "Best Casting",
        &[
            "Hamnet",
            "Marty Supreme",
            "One Battle After Another",
            "The Secret Agent",
            "Sinners",
        ],
    ),
    (
        "Best Live Action Short Film",
        &[
            "Butcher's Stain",
            "A Friend of Dorothy",
            "Jane Austen's Period Drama",
            "The Singers",
            "Two People Exchanging Saliva",
        ],
    ),
    (
        "Best Animated Short Film",
        &[
            "Butterfly",
            "Forevergreen",
            "The Girl Who Cried Pearls",
            "Retirement Plan",
            "The Three Sisters",
        ],
    ),
    (
        "Best Documentary Short Film",
        &[
            "All the Empty Rooms",
            "Armed Only with a Camera: The Life and Death of Brent Renaud",
            "Children No More: Were and Are Gone",
            "The Devil Is Busy",
            "Perfectly a Strangeness",
        ],
    ),
];

/// Fresh copy of the default categories; callers may mutate it freely.
pub fn default_categories() -> Vec<CategoryEntity> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, nominees)| CategoryEntity::new(*name, nominees.iter().copied()))
        .collect()
}
