mod ranking_tests;
