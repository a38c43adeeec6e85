use augmented_avl::{AugmentedMap, SubtreeSize, TreeList};

fn main() {
    let mut list: TreeList<&str> = TreeList::new();

    for word in ["one", "two", "three", "four", "five", "six", "seven"] {
        list.push(word);
        list.assert_invariants();
        println!("{list:?}");
    }

    let removed = list.remove(2).unwrap();
    assert_eq!(removed, "three");
    list.assert_invariants();
    println!("removed {removed:?}: {list:?}");

    println!("index of \"six\": {:?}", list.index_of(&"six"));

    let mut graph = String::new();
    list.dotgraph("words", &mut graph).unwrap();
    println!("{graph}");

    let mut map: AugmentedMap<u32, char, SubtreeSize> = AugmentedMap::new();
    for (key, value) in [(5, 'a'), (1, 'b'), (5, 'c'), (3, 'd')] {
        map.insert(key, value);
        map.assert_invariants();
    }

    // The second smallest entry.
    println!("rank 2: {:?}", map.get_by_property(2));
    println!("{map:?}");
}
